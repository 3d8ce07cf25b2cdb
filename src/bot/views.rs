//! Catalog bot UI components
//!
//! Contains keyboards, text messages, and formatters shown to users.

use crate::bot::callback::CallbackAction;
use crate::bot::gateway::{Button, Keyboard};
use crate::catalog::ModRecord;
use crate::config::CATALOG_PAGE_SIZE;
use crate::lookup::CandidateMod;
use crate::utils::{escape_html, truncate_str};

// ─────────────────────────────────────────────────────────────────────────────
// Trait definition
// ─────────────────────────────────────────────────────────────────────────────

/// Trait for catalog bot text rendering
pub trait CatalogView {
    /// Reply to users outside the allow-list
    fn access_denied() -> &'static str;
    /// Reply to non-administrators using an administrative command
    fn command_denied() -> &'static str;
    /// Callback answer for non-administrators pressing an administrative button
    fn button_denied() -> &'static str;
    /// Greeting for `/start` and `/help`
    fn welcome_message() -> &'static str;
    /// Label of the "show saved mods" button
    fn show_saved_button() -> &'static str;
    /// Acknowledgement for the restart command
    fn restarting() -> &'static str;
    /// Shown instead of a page when nothing is saved
    fn catalog_empty() -> &'static str;
    /// Heading of a catalog page
    fn page_header() -> &'static str;
    /// Search failed on the provider side
    fn provider_unavailable() -> &'static str;
    /// Search found nothing
    fn no_results() -> &'static str;
    /// Prompt above fresh search results
    fn choose_mod() -> &'static str;
    /// Prompt above search results restored with "back"
    fn choose_mod_again() -> &'static str;
    /// Selection from a missing or stale session
    fn stale_session() -> &'static str;
    /// Selection index past the end of the results
    fn invalid_choice() -> &'static str;
    /// Fetching a mod for saving failed
    fn fetch_failed() -> &'static str;
    /// The mod is already in the catalog
    fn already_saved() -> &'static str;
    /// The mod was saved
    fn saved() -> &'static str;
    /// The saved mod no longer exists
    fn not_found() -> &'static str;
    /// The saved mod was deleted
    fn deleted() -> &'static str;
    /// "Back to search" without usable search results
    fn history_unavailable() -> &'static str;
    /// The turn failed for an internal reason
    fn internal_error() -> &'static str;
}

// ─────────────────────────────────────────────────────────────────────────────
// Default implementation
// ─────────────────────────────────────────────────────────────────────────────

/// Default Russian-language implementation of `CatalogView`
pub struct DefaultCatalogView;

impl CatalogView for DefaultCatalogView {
    fn access_denied() -> &'static str {
        "У вас нет доступа к этому боту."
    }

    fn command_denied() -> &'static str {
        "У вас нет доступа к этой команде."
    }

    fn button_denied() -> &'static str {
        "У вас нет доступа к этой кнопке."
    }

    fn welcome_message() -> &'static str {
        "Привет! Отправь название мода для Minecraft, и я найду его на Modrinth.\n\
         Или нажми на кнопку ниже, чтобы посмотреть сохранённые моды.\n\
         Команды: /start; /list"
    }

    fn show_saved_button() -> &'static str {
        "📦 Показать сохранённые моды"
    }

    fn restarting() -> &'static str {
        "Бот перезапускается (требуется ручной рестарт скрипта)."
    }

    fn catalog_empty() -> &'static str {
        "Список модов пуст."
    }

    fn page_header() -> &'static str {
        "Сохранённые моды:"
    }

    fn provider_unavailable() -> &'static str {
        "Ошибка при обращении к Modrinth."
    }

    fn no_results() -> &'static str {
        "Не удалось найти подходящих модов на Modrinth."
    }

    fn choose_mod() -> &'static str {
        "Пожалуйста, выбери мод:"
    }

    fn choose_mod_again() -> &'static str {
        "Пожалуйста, выберите мод из списка кнопок ниже:"
    }

    fn stale_session() -> &'static str {
        "Сессия устарела, начните поиск заново."
    }

    fn invalid_choice() -> &'static str {
        "Неверный выбор."
    }

    fn fetch_failed() -> &'static str {
        "Ошибка при получении данных мода."
    }

    fn already_saved() -> &'static str {
        "Этот мод уже сохранён."
    }

    fn saved() -> &'static str {
        "Мод сохранён!"
    }

    fn not_found() -> &'static str {
        "Мод не найден."
    }

    fn deleted() -> &'static str {
        "✅ Мод удалён."
    }

    fn history_unavailable() -> &'static str {
        "История поиска недоступна, начните заново."
    }

    fn internal_error() -> &'static str {
        "Произошла ошибка, попробуйте позже."
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Button labels
// ─────────────────────────────────────────────────────────────────────────────

const LABEL_SAVE: &str = "💾 Сохранить";
const LABEL_DOWNLOAD: &str = "🔗 Скачать";
const LABEL_BACK: &str = "🔙 Назад";
const LABEL_DELETE: &str = "🗑 Удалить";
const LABEL_PREV: &str = "⬅️";
const LABEL_NEXT: &str = "➡️";

/// Longer mod names are cut in button labels
const BUTTON_LABEL_MAX_CHARS: usize = 48;

// ─────────────────────────────────────────────────────────────────────────────
// Formatters and keyboards
// ─────────────────────────────────────────────────────────────────────────────

/// Keyboard under the welcome message
#[must_use]
pub fn welcome_keyboard() -> Keyboard {
    Keyboard::new().button(Button::callback(
        DefaultCatalogView::show_saved_button(),
        CallbackAction::ShowSaved,
    ))
}

/// One button per search result, in result order
#[must_use]
pub fn candidates_keyboard(candidates: &[CandidateMod]) -> Keyboard {
    candidates
        .iter()
        .enumerate()
        .fold(Keyboard::new(), |kb, (index, candidate)| {
            kb.button(Button::callback(
                truncate_str(&candidate.name, BUTTON_LABEL_MAX_CHARS),
                CallbackAction::Candidate(index),
            ))
        })
}

/// Detail text for a search result
#[must_use]
pub fn candidate_detail_text(candidate: &CandidateMod) -> String {
    format!(
        "<b>{}</b>\n\n{}",
        escape_html(&candidate.name),
        escape_html(&candidate.description)
    )
}

/// Detail keyboard for a search result; no save button once it is saved
#[must_use]
pub fn candidate_detail_keyboard(candidate: &CandidateMod, already_saved: bool) -> Keyboard {
    let kb = if already_saved {
        Keyboard::new()
    } else {
        Keyboard::new().button(Button::callback(
            LABEL_SAVE,
            CallbackAction::Save(candidate.id.clone()),
        ))
    };
    kb.button(Button::url(LABEL_DOWNLOAD, candidate.download_url.clone()))
        .button(Button::callback(LABEL_BACK, CallbackAction::BackToSearch))
}

/// Detail text for a saved mod
#[must_use]
pub fn saved_detail_text(record: &ModRecord) -> String {
    format!("<b>{}</b>", escape_html(&record.name))
}

/// Detail keyboard for a saved mod; the delete button is for administrators
#[must_use]
pub fn saved_detail_keyboard(record: &ModRecord, is_admin: bool) -> Keyboard {
    let kb = Keyboard::new().button(Button::url(LABEL_DOWNLOAD, record.download_url.clone()));
    let kb = if is_admin {
        kb.button(Button::callback(
            LABEL_DELETE,
            CallbackAction::Delete(record.id.clone()),
        ))
    } else {
        kb
    };
    kb.button(Button::callback(LABEL_BACK, CallbackAction::BackToList))
}

/// Keyboard under the delete confirmation
#[must_use]
pub fn back_to_list_keyboard() -> Keyboard {
    Keyboard::new().button(Button::callback(LABEL_BACK, CallbackAction::BackToList))
}

/// A rendered catalog page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogPage {
    /// Page actually rendered, after clamping
    pub page: usize,
    /// Message text
    pub text: String,
    /// Row buttons followed by the navigation row
    pub keyboard: Keyboard,
}

/// Number of pages needed for `total` saved mods
#[must_use]
pub const fn page_count(total: usize) -> usize {
    total.div_ceil(CATALOG_PAGE_SIZE)
}

/// Render page `page` of the catalog
///
/// Pages past the end are clamped to the last page. Returns `None` for an
/// empty catalog.
#[must_use]
pub fn render_catalog_page(mods: &[ModRecord], page: usize) -> Option<CatalogPage> {
    let pages = page_count(mods.len());
    if pages == 0 {
        return None;
    }
    let page = page.min(pages - 1);
    let start = page * CATALOG_PAGE_SIZE;
    let end = (start + CATALOG_PAGE_SIZE).min(mods.len());
    let current = &mods[start..end];

    let lines: Vec<String> = current
        .iter()
        .enumerate()
        .map(|(i, record)| format!("{}. {}", start + i + 1, escape_html(&record.name)))
        .collect();
    let text = format!("{}\n{}", DefaultCatalogView::page_header(), lines.join("\n"));

    let keyboard = current.iter().fold(Keyboard::new(), |kb, record| {
        kb.button(Button::callback(
            truncate_str(&record.name, BUTTON_LABEL_MAX_CHARS),
            CallbackAction::ViewSaved(record.id.clone()),
        ))
    });

    let mut nav = Vec::new();
    if page > 0 {
        nav.push(Button::callback(LABEL_PREV, CallbackAction::Page(page - 1)));
    }
    if end < mods.len() {
        nav.push(Button::callback(LABEL_NEXT, CallbackAction::Page(page + 1)));
    }

    Some(CatalogPage {
        page,
        text,
        keyboard: keyboard.row(nav),
    })
}
