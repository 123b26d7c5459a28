//! Font discovery for plot text.
//!
//! Plot text needs a TrueType font registered with the rasterizer. The first
//! readable font from `DEIXIS_PLOT_FONT` or a list of common system locations
//! is registered once per process; without one, plots are drawn without
//! captions or axis labels.

use std::path::PathBuf;
use std::sync::OnceLock;

use plotters::style::{register_font, FontStyle};
use tracing::{debug, warn};

/// Environment variable naming a `.ttf` file to use for plot text.
pub const FONT_ENV: &str = "DEIXIS_PLOT_FONT";

/// Family name plot text is requested with.
pub const FONT_FAMILY: &str = "sans-serif";

const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

static TEXT_AVAILABLE: OnceLock<bool> = OnceLock::new();

/// Whether plot text can be rendered in this process.
pub fn text_available() -> bool {
    *TEXT_AVAILABLE.get_or_init(register_first_font)
}

fn register_first_font() -> bool {
    let configured = std::env::var_os(FONT_ENV).map(PathBuf::from);
    let candidates = configured
        .into_iter()
        .chain(SYSTEM_FONTS.iter().map(PathBuf::from));

    for path in candidates {
        let Ok(bytes) = std::fs::read(&path) else {
            continue;
        };
        // The rasterizer keeps a 'static reference for the life of the process.
        let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
        match register_font(FONT_FAMILY, FontStyle::Normal, bytes) {
            Ok(()) => {
                debug!("Plot font: {}", path.display());
                return true;
            }
            Err(_) => warn!("Ignoring unusable font {}", path.display()),
        }
    }

    debug!("No plot font found; rendering plots without text");
    false
}
