/// Toolbar badge: tab counts and a colour that reddens as tabs pile up
use serde::{Deserialize, Serialize};

use crate::tab_data::TabInfo;

const BADGE_MAX: usize = 99;
const GOOD_COLOR: [u8; 3] = [0x00, 0x7a, 0x1f];
const BAD_COLOR: [u8; 3] = [0x9b, 0x1c, 0x1c];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Badge {
    pub text: String,
    pub color: String,
}

impl Badge {
    pub fn for_tabs(info: &TabInfo) -> Badge {
        Badge {
            text: badge_text(info.normal.len(), info.incognito.len()),
            color: badge_color(info.all.len()),
        }
    }
}

/// `N`, or `N/M` while incognito tabs are open. Each count is capped at 99.
pub fn badge_text(normal: usize, incognito: usize) -> String {
    if incognito == 0 {
        return normal.to_string();
    }
    format!("{}/{}", normal.min(BADGE_MAX), incognito.min(BADGE_MAX))
}

/// Blend from green to red by tab count, as `#rrggbb`.
///
/// The first twenty tabs are free; at 99 the badge is fully red.
pub fn badge_color(tab_count: usize) -> String {
    let count = if tab_count >= BADGE_MAX {
        tab_count
    } else {
        tab_count.saturating_sub(20).max(1)
    };
    let target = (count as f64 / BADGE_MAX as f64).min(1.0);
    let initial = 1.0 - target;

    let channels: String = GOOD_COLOR
        .iter()
        .zip(BAD_COLOR)
        .map(|(&good, bad)| {
            let blended = f64::from(good) * initial + f64::from(bad) * target;
            format!("{:02x}", blended.floor() as u8)
        })
        .collect();
    format!("#{}", channels)
}
