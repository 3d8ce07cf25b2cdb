//! Public-surface checks for the pieces the chat flow is assembled from:
//! callback data, access decisions and catalog paging.

use mod_catalog_bot::access::{AccessPolicy, Identity};
use mod_catalog_bot::bot::callback::CallbackAction;
use mod_catalog_bot::bot::views::{page_count, render_catalog_page};
use mod_catalog_bot::catalog::ModRecord;

fn user(name: &str) -> Identity {
    Identity::new(7, Some(name.to_string()))
}

#[test]
fn test_callback_data_matches_wire_format() {
    let cases = [
        (CallbackAction::ShowSaved, "show_saved_mods"),
        (CallbackAction::Page(2), "page:2"),
        (CallbackAction::Candidate(0), "mod:0"),
        (CallbackAction::Save("AANobbMI".to_string()), "save:AANobbMI"),
        (CallbackAction::ViewSaved("AANobbMI".to_string()), "view:AANobbMI"),
        (CallbackAction::Delete("AANobbMI".to_string()), "delete:AANobbMI"),
        (CallbackAction::BackToSearch, "back_to_search"),
        (CallbackAction::BackToList, "back_to_list"),
    ];
    for (action, data) in cases {
        assert_eq!(action.encode(), data);
        assert!(data.len() <= 64);
    }
}

#[test]
fn test_forged_callback_data_is_rejected() {
    for data in ["", "page:", "page:-1", "mod:x", "save:", "delete:a:b", "show_saved"] {
        assert_eq!(CallbackAction::decode(data), None, "{data:?}");
    }
}

#[test]
fn test_admin_is_not_implied_by_membership() {
    let policy = AccessPolicy::new(["Keptchypk", "I_am_kil1ed"], "Keptchypk");

    assert!(policy.is_authorized(&user("I_am_kil1ed")));
    assert!(!policy.is_administrator(&user("I_am_kil1ed")));
    assert!(policy.is_administrator(&user("Keptchypk")));
    assert!(!policy.is_authorized(&user("keptchypk")));
    assert!(!policy.is_authorized(&Identity::new(7, None)));
}

#[test]
fn test_paging_covers_every_saved_mod_once() {
    let mods: Vec<ModRecord> = (0..23)
        .map(|i| ModRecord {
            id: format!("id{i}"),
            name: format!("Mod {i}"),
            download_url: format!("https://modrinth.com/mod/m{i}"),
        })
        .collect();

    assert_eq!(page_count(mods.len()), 3);

    let viewed: Vec<CallbackAction> = (0..page_count(mods.len()))
        .filter_map(|page| render_catalog_page(&mods, page))
        .flat_map(|page| page.keyboard.actions().cloned().collect::<Vec<_>>())
        .filter(|action| matches!(action, CallbackAction::ViewSaved(_)))
        .collect();
    let expected: Vec<CallbackAction> = mods
        .iter()
        .map(|m| CallbackAction::ViewSaved(m.id.clone()))
        .collect();
    assert_eq!(viewed, expected);
}
