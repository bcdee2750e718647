use base64::Engine;
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Page;
use tracing::debug;
use webgaze_core::{Error, Result};

const MAX_BYTES: usize = 5 * 1024 * 1024;
const BASE_WIDTH: u32 = 1600;
const BASE_HEIGHT: u32 = 900;
const MIN_DIMENSION: u32 = 800;
const MAX_DIMENSION: u32 = 1920;
const MAX_SHRINK_ATTEMPTS: u32 = 3;
const SHRINK_FACTOR: f64 = 0.75;

/// Viewport-resize plus non-full-page PNG capture, abstracted so the live
/// page and test stubs share the reduction algorithm.
#[async_trait::async_trait]
pub trait CaptureTarget {
    async fn set_viewport(&mut self, width: u32, height: u32) -> Result<()>;
    async fn capture_png(&mut self) -> Result<Vec<u8>>;
}

/// Capture a viewport PNG no larger than 5 MiB, returned base64-encoded.
///
/// Shrink factors are powers of 0.75 applied to the *original* 1600x900
/// dimensions, clamped to [800, 1920] per axis. Dimensions are the only
/// lever; PNG compression level is never touched. After three shrink
/// attempts a final 800x800 capture is tried before giving up.
pub async fn capture_reduced<T>(target: &mut T) -> Result<String>
where
    T: CaptureTarget + Send,
{
    target.set_viewport(BASE_WIDTH, BASE_HEIGHT).await?;
    let mut shot = target.capture_png().await?;

    let mut attempt = 0u32;
    while shot.len() > MAX_BYTES && attempt < MAX_SHRINK_ATTEMPTS {
        attempt += 1;
        let factor = SHRINK_FACTOR.powi(attempt as i32);
        let width = shrink_dimension(BASE_WIDTH, factor);
        let height = shrink_dimension(BASE_HEIGHT, factor);
        debug!(attempt, width, height, bytes = shot.len(), "screenshot over size cap, shrinking viewport");
        target.set_viewport(width, height).await?;
        shot = target.capture_png().await?;
    }

    if shot.len() > MAX_BYTES {
        target.set_viewport(MIN_DIMENSION, MIN_DIMENSION).await?;
        shot = target.capture_png().await?;
        if shot.len() > MAX_BYTES {
            return Err(Error::ScreenshotOversized);
        }
    }

    Ok(base64::engine::general_purpose::STANDARD.encode(&shot))
}

fn shrink_dimension(base: u32, factor: f64) -> u32 {
    ((base as f64 * factor) as u32).clamp(MIN_DIMENSION, MAX_DIMENSION)
}

/// The live browser page as a capture target.
pub struct PageTarget<'a> {
    page: &'a Page,
}

impl<'a> PageTarget<'a> {
    pub fn new(page: &'a Page) -> Self {
        Self { page }
    }
}

#[async_trait::async_trait]
impl CaptureTarget for PageTarget<'_> {
    async fn set_viewport(&mut self, width: u32, height: u32) -> Result<()> {
        self.page
            .execute(SetDeviceMetricsOverrideParams::new(
                width as i64,
                height as i64,
                1.0,
                false,
            ))
            .await
            .map_err(|e| Error::Browser(format!("viewport resize failed: {e}")))?;
        Ok(())
    }

    async fn capture_png(&mut self) -> Result<Vec<u8>> {
        self.page
            .screenshot(
                ScreenshotParams::builder()
                    .format(CaptureScreenshotFormat::Png)
                    .full_page(false)
                    .build(),
            )
            .await
            .map_err(|e| Error::Browser(format!("screenshot capture failed: {e}")))
    }
}
