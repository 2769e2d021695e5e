/// Browser host collaborator
use crate::error::Result;
use crate::tab_data::{BrowserWindow, Tab, TabGroupInfo};

/// Read access to the browser's tabs, windows and tab groups.
///
/// The extension runs single-threaded, so these futures are not `Send`.
#[allow(async_fn_in_trait)]
pub trait BrowserHost {
    async fn all_tabs(&self) -> Result<Vec<Tab>>;

    async fn all_windows(&self) -> Result<Vec<BrowserWindow>>;

    /// `Ok(None)` when the group no longer exists.
    async fn tab_group(&self, id: i32) -> Result<Option<TabGroupInfo>>;
}

impl<H: BrowserHost> BrowserHost for &H {
    async fn all_tabs(&self) -> Result<Vec<Tab>> {
        (**self).all_tabs().await
    }

    async fn all_windows(&self) -> Result<Vec<BrowserWindow>> {
        (**self).all_windows().await
    }

    async fn tab_group(&self, id: i32) -> Result<Option<TabGroupInfo>> {
        (**self).tab_group(id).await
    }
}
