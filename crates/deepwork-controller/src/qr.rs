//! QR image link for the current page.

use deepwork_core::{DeepWorkError, DeepWorkResult};

use crate::platform::TabService;

pub const QR_API: &str = "https://api.qrserver.com/v1/create-qr-code/";

/// Edge length of the generated image in pixels
pub const QR_SIZE: u32 = 280;

const QR_MARGIN: u32 = 20;

/// Image URL encoding `data` as a QR code
pub fn image_url(data: &str) -> String {
    format!(
        "{}?size={size}x{size}&data={}&margin={}&format=png",
        QR_API,
        urlencoding::encode(data),
        QR_MARGIN,
        size = QR_SIZE,
    )
}

/// URL of the active tab in the current window
pub async fn active_tab_url(tabs: &dyn TabService) -> DeepWorkResult<String> {
    tabs.active_tab(None)
        .await?
        .and_then(|tab| tab.url)
        .filter(|url| !url.is_empty())
        .ok_or_else(|| DeepWorkError::tab("No URL found for the active tab"))
}
