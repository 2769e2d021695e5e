/// Data structures mirrored from the browser host
use serde::{Deserialize, Serialize};

/// Window id used for tabs the host reports without a window.
pub const WINDOW_ID_NONE: i32 = -1;

/// Tab id the host reports for tabs outside the tab strip, such as devtools.
/// Several tabs can carry it at once.
pub const TAB_ID_NONE: i32 = -1;

/// Tab-group id the host uses for tabs outside any group.
pub const TAB_GROUP_ID_NONE: i32 = -1;

/// Information about a browser tab, as reported by `chrome.tabs`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Tab {
    pub id: i32,
    #[serde(default)]
    pub index: i32,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub window_id: Option<i32>,
    #[serde(default)]
    pub group_id: Option<i32>,
    #[serde(default)]
    pub audible: bool,
    #[serde(default)]
    pub muted_info: Option<MutedInfo>,
    #[serde(default)]
    pub incognito: bool,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub discarded: bool,
    #[serde(default)]
    pub pinned: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct MutedInfo {
    pub muted: bool,
}

impl Tab {
    pub fn new(id: i32, url: &str, title: &str) -> Tab {
        Tab {
            id,
            index: id,
            title: Some(title.to_string()),
            url: Some(url.to_string()),
            window_id: Some(1),
            ..Tab::default()
        }
    }

    pub fn is_muted(&self) -> bool {
        self.muted_info.is_some_and(|info| info.muted)
    }

    /// Window this tab belongs to, or [`WINDOW_ID_NONE`].
    pub fn window(&self) -> i32 {
        self.window_id.unwrap_or(WINDOW_ID_NONE)
    }

    /// Tab group this tab belongs to, or [`TAB_GROUP_ID_NONE`].
    pub fn tab_group(&self) -> i32 {
        self.group_id.unwrap_or(TAB_GROUP_ID_NONE)
    }
}

/// A browser window, as reported by `chrome.windows`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct BrowserWindow {
    pub id: i32,
    #[serde(default)]
    pub focused: bool,
    #[serde(default)]
    pub incognito: bool,
}

impl BrowserWindow {
    /// Stand-in for a window the host no longer knows about.
    pub fn placeholder(id: i32) -> BrowserWindow {
        BrowserWindow {
            id,
            ..BrowserWindow::default()
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TabGroupColor {
    #[default]
    Grey,
    Blue,
    Red,
    Yellow,
    Green,
    Pink,
    Purple,
    Cyan,
    Orange,
}

/// Tab group metadata, as reported by `chrome.tabGroups`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TabGroupInfo {
    pub id: i32,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub color: TabGroupColor,
    #[serde(default)]
    pub collapsed: bool,
    #[serde(default = "no_window")]
    pub window_id: i32,
}

fn no_window() -> i32 {
    WINDOW_ID_NONE
}

impl TabGroupInfo {
    /// Pseudo-group holding every tab that is not in a host tab group.
    pub fn ungrouped() -> TabGroupInfo {
        TabGroupInfo {
            id: TAB_GROUP_ID_NONE,
            title: Some("Ungrouped".to_string()),
            color: TabGroupColor::Grey,
            collapsed: false,
            window_id: WINDOW_ID_NONE,
        }
    }

    /// Stand-in for a group id the host could not resolve.
    pub fn placeholder(id: i32) -> TabGroupInfo {
        TabGroupInfo {
            id,
            title: None,
            color: TabGroupColor::Grey,
            collapsed: false,
            window_id: WINDOW_ID_NONE,
        }
    }
}

/// All open tabs, split by browsing mode
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TabInfo {
    pub normal: Vec<Tab>,
    pub incognito: Vec<Tab>,
    pub all: Vec<Tab>,
}

impl TabInfo {
    pub fn from_tabs(tabs: Vec<Tab>) -> TabInfo {
        let (incognito, normal): (Vec<Tab>, Vec<Tab>) =
            tabs.iter().cloned().partition(|tab| tab.incognito);
        TabInfo {
            normal,
            incognito,
            all: tabs,
        }
    }

    /// Short count summary: `N` or `N/M` when incognito tabs are open.
    pub fn text(&self) -> String {
        if self.incognito.is_empty() {
            self.normal.len().to_string()
        } else {
            format!("{}/{}", self.normal.len(), self.incognito.len())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tab_creation() {
        let tab = Tab::new(1, "https://google.com", "Google");

        assert_eq!(tab.id, 1);
        assert_eq!(tab.url.as_deref(), Some("https://google.com"));
        assert_eq!(tab.title.as_deref(), Some("Google"));
        assert!(!tab.is_muted());
        assert_eq!(tab.window(), 1);
        assert_eq!(tab.tab_group(), TAB_GROUP_ID_NONE);
    }

    #[test]
    fn test_deserialize_host_tab() {
        let json = r#"{
            "id": 7,
            "index": 3,
            "title": "Video",
            "url": "https://www.youtube.com/watch?v=abc",
            "windowId": 2,
            "groupId": -1,
            "audible": true,
            "mutedInfo": { "muted": true },
            "incognito": false,
            "active": true,
            "discarded": false,
            "pinned": false,
            "favIconUrl": "https://www.youtube.com/favicon.ico"
        }"#;

        let tab: Tab = serde_json::from_str(json).unwrap();

        assert_eq!(tab.id, 7);
        assert_eq!(tab.window(), 2);
        assert!(tab.audible);
        assert!(tab.is_muted());
        assert!(tab.active);
    }

    #[test]
    fn test_deserialize_sparse_tab() {
        let tab: Tab = serde_json::from_str(r#"{ "id": 9 }"#).unwrap();

        assert_eq!(tab.url, None);
        assert_eq!(tab.window(), WINDOW_ID_NONE);
        assert!(!tab.is_muted());
    }

    #[test]
    fn test_tab_info_split() {
        let mut private = Tab::new(3, "https://example.com", "Private");
        private.incognito = true;
        let tabs = vec![
            Tab::new(1, "https://google.com", "Google"),
            Tab::new(2, "https://github.com", "GitHub"),
            private,
        ];

        let info = TabInfo::from_tabs(tabs);

        assert_eq!(info.normal.len(), 2);
        assert_eq!(info.incognito.len(), 1);
        assert_eq!(info.all.len(), 3);
        assert_eq!(info.text(), "2/1");
    }

    #[test]
    fn test_tab_info_text_without_incognito() {
        let info = TabInfo::from_tabs(vec![Tab::new(1, "https://google.com", "Google")]);
        assert_eq!(info.text(), "1");
    }

    #[test]
    fn test_tab_group_color_wire_format() {
        let raw = r#"{ "id": 4, "title": "Work", "color": "purple", "collapsed": true, "windowId": 1 }"#;
        let group: TabGroupInfo = serde_json::from_str(raw).unwrap();

        assert_eq!(group.color, TabGroupColor::Purple);
        assert_eq!(group.title.as_deref(), Some("Work"));
    }
}
