//! Inline button actions and their callback-data encoding.
//!
//! Telegram hands callback data back as an opaque string of at most 64
//! bytes. Every button the bot renders carries one [`CallbackAction`];
//! anything that does not decode to one is ignored.

/// Callback data for the "show saved mods" button
pub const CALLBACK_SHOW_SAVED: &str = "show_saved_mods";
/// Callback data for returning to the search results
pub const CALLBACK_BACK_TO_SEARCH: &str = "back_to_search";
/// Callback data for returning to the catalog listing
pub const CALLBACK_BACK_TO_LIST: &str = "back_to_list";

const PREFIX_PAGE: &str = "page:";
const PREFIX_CANDIDATE: &str = "mod:";
const PREFIX_SAVE: &str = "save:";
const PREFIX_VIEW: &str = "view:";
const PREFIX_DELETE: &str = "delete:";

/// Intent carried by an inline button
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackAction {
    /// Open the catalog listing
    ShowSaved,
    /// Show a catalog page (0-based)
    Page(usize),
    /// Pick a search result by index
    Candidate(usize),
    /// Save a mod by project ID
    Save(String),
    /// Open a saved mod
    ViewSaved(String),
    /// Delete a saved mod (administrator only)
    Delete(String),
    /// Return to the last search results
    BackToSearch,
    /// Return to the first catalog page
    BackToList,
}

impl CallbackAction {
    /// Encode as callback data
    #[must_use]
    pub fn encode(&self) -> String {
        match self {
            Self::ShowSaved => CALLBACK_SHOW_SAVED.to_string(),
            Self::Page(page) => format!("{PREFIX_PAGE}{page}"),
            Self::Candidate(index) => format!("{PREFIX_CANDIDATE}{index}"),
            Self::Save(id) => format!("{PREFIX_SAVE}{id}"),
            Self::ViewSaved(id) => format!("{PREFIX_VIEW}{id}"),
            Self::Delete(id) => format!("{PREFIX_DELETE}{id}"),
            Self::BackToSearch => CALLBACK_BACK_TO_SEARCH.to_string(),
            Self::BackToList => CALLBACK_BACK_TO_LIST.to_string(),
        }
    }

    /// Decode callback data; unknown or malformed data yields `None`
    #[must_use]
    pub fn decode(data: &str) -> Option<Self> {
        match data {
            CALLBACK_SHOW_SAVED => return Some(Self::ShowSaved),
            CALLBACK_BACK_TO_SEARCH => return Some(Self::BackToSearch),
            CALLBACK_BACK_TO_LIST => return Some(Self::BackToList),
            _ => {}
        }

        if let Some(page) = data.strip_prefix(PREFIX_PAGE) {
            return parse_index(page).map(Self::Page);
        }
        if let Some(index) = data.strip_prefix(PREFIX_CANDIDATE) {
            return parse_index(index).map(Self::Candidate);
        }
        if let Some(id) = data.strip_prefix(PREFIX_SAVE) {
            return parse_id(id).map(Self::Save);
        }
        if let Some(id) = data.strip_prefix(PREFIX_VIEW) {
            return parse_id(id).map(Self::ViewSaved);
        }
        if let Some(id) = data.strip_prefix(PREFIX_DELETE) {
            return parse_id(id).map(Self::Delete);
        }
        None
    }
}

fn parse_index(raw: &str) -> Option<usize> {
    // usize::from_str accepts a leading '+'
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

/// Modrinth project IDs are base62; anything else is not ours
fn parse_id(raw: &str) -> Option<String> {
    (!raw.is_empty() && raw.bytes().all(|b| b.is_ascii_alphanumeric())).then(|| raw.to_string())
}
