/// Main page: every saved group, with search, categories and backups

use std::rc::Rc;

use futures::lock::Mutex;
use log::error;
use patternfly_yew::prelude::*;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{JsFuture, spawn_local};
use web_sys::HtmlInputElement;
use yew::prelude::*;

use crate::backup::{backup_filename, parse_document, to_json};
use crate::chrome::{
    ChromeStorage, RuntimeChannel, SystemClock, exportToFile, from_js, onLocalStorageChanged,
};
use crate::config::KeeperConfig;
use crate::keeper::{Action, Keeper};
use crate::messages::RemoteRestorer;
use crate::storage::StorageAdapter;
use crate::store::{CategoryFilter, GroupStore, ViewQuery};
use crate::ui::components::{CategoryBar, GroupCard, PaginationBar};

#[derive(Clone, PartialEq)]
enum ViewState {
    Loading,
    Idle,
    Busy(String),
    Error(String),
}

fn new_keeper() -> Keeper {
    let config = KeeperConfig::default();
    let storage = StorageAdapter::new(
        Rc::new(ChromeStorage::local()),
        Rc::new(ChromeStorage::sync()),
        config.clone(),
    );
    Keeper::new(
        storage,
        Rc::new(RemoteRestorer::new(RuntimeChannel)),
        Rc::new(SystemClock),
        config,
    )
}

fn alert(message: &str) {
    if let Some(window) = web_sys::window() {
        let _ = window.alert_with_message(message);
    }
}

fn confirm(message: &str) -> bool {
    web_sys::window()
        .and_then(|window| window.confirm_with_message(message).ok())
        .unwrap_or(false)
}

#[function_component(MainPage)]
pub fn main_page() -> Html {
    let keeper = use_memo((), |_| Mutex::new(new_keeper()));
    let snapshot = use_state(|| GroupStore::empty(&KeeperConfig::default()));
    let state = use_state(|| ViewState::Loading);
    let query = use_state(ViewQuery::default);
    let editing_group = use_state(|| None::<String>); // group ID being renamed
    let edit_input_value = use_state(String::new);
    let new_category = use_state(String::new);

    // Every mutation goes through here, one at a time
    let dispatch = {
        let keeper = keeper.clone();
        let snapshot = snapshot.clone();
        let state = state.clone();

        Callback::from(move |action: Action| {
            let keeper = keeper.clone();
            let snapshot = snapshot.clone();
            let state = state.clone();

            spawn_local(async move {
                let mut keeper = keeper.lock().await;
                match keeper.dispatch(action).await {
                    Ok(notice) => {
                        snapshot.set(keeper.store().clone());
                        state.set(ViewState::Idle);
                        if let Some(notice) = notice {
                            alert(&notice);
                        }
                    }
                    Err(e) => {
                        error!("Action failed: {}", e);
                        snapshot.set(keeper.store().clone());
                        state.set(ViewState::Error(e.to_string()));
                        alert(&format!("Failed: {}", e));
                    }
                }
            });
        })
    };

    // Load storage and follow other instances' writes
    {
        let dispatch = dispatch.clone();
        use_effect_with((), move |_| {
            dispatch.emit(Action::Load);

            let on_change = {
                let dispatch = dispatch.clone();
                Closure::wrap(Box::new(move |new_value: JsValue| {
                    let value = if new_value.is_undefined() || new_value.is_null() {
                        None
                    } else {
                        match from_js(new_value) {
                            Ok(value) => Some(value),
                            Err(e) => {
                                error!("Ignoring storage change: {}", e);
                                return;
                            }
                        }
                    };
                    dispatch.emit(Action::Remote(value));
                }) as Box<dyn Fn(JsValue)>)
            };
            onLocalStorageChanged(on_change.as_ref().unchecked_ref());
            on_change.forget();
            || ()
        });
    }

    let on_search_input = {
        let query = query.clone();
        Callback::from(move |e: InputEvent| {
            if let Some(input) = e.target_dyn_into::<HtmlInputElement>() {
                query.set(query.with_search(input.value()));
            }
        })
    };

    let on_select_category = {
        let query = query.clone();
        Callback::from(move |filter: CategoryFilter| {
            query.set(query.with_category(filter));
        })
    };

    let on_page = {
        let query = query.clone();
        Callback::from(move |page: usize| {
            query.set(query.with_page(page));
        })
    };

    let on_new_category_input = {
        let new_category = new_category.clone();
        Callback::from(move |e: InputEvent| {
            if let Some(input) = e.target_dyn_into::<HtmlInputElement>() {
                new_category.set(input.value());
            }
        })
    };

    let on_add_category = {
        let new_category = new_category.clone();
        let dispatch = dispatch.clone();
        Callback::from(move |_| {
            let name = new_category.trim().to_string();
            if !name.is_empty() {
                dispatch.emit(Action::AddCategory(name));
                new_category.set(String::new());
            }
        })
    };

    let on_restore_all = {
        let dispatch = dispatch.clone();
        let state = state.clone();
        Callback::from(move |group_id: String| {
            state.set(ViewState::Busy("Restoring tabs...".to_string()));
            dispatch.emit(Action::RestoreAll(group_id));
        })
    };

    let on_restore_tab = {
        let dispatch = dispatch.clone();
        Callback::from(move |(group_id, index): (String, usize)| {
            dispatch.emit(Action::RestoreOne(group_id, index));
        })
    };

    let on_delete_tab = {
        let dispatch = dispatch.clone();
        Callback::from(move |(group_id, index): (String, usize)| {
            dispatch.emit(Action::DeleteTab(group_id, index));
        })
    };

    let on_delete_group = {
        let dispatch = dispatch.clone();
        Callback::from(move |group_id: String| {
            if confirm("Delete this tab group?") {
                dispatch.emit(Action::DeleteGroup(group_id));
            }
        })
    };

    let on_start_edit = {
        let editing_group = editing_group.clone();
        let edit_input_value = edit_input_value.clone();
        Callback::from(move |(group_id, current_title): (String, String)| {
            editing_group.set(Some(group_id));
            edit_input_value.set(current_title);
        })
    };

    let on_save_edit = {
        let editing_group = editing_group.clone();
        let edit_input_value = edit_input_value.clone();
        let dispatch = dispatch.clone();
        Callback::from(move |_| {
            if let Some(group_id) = (*editing_group).clone() {
                dispatch.emit(Action::Rename(group_id, edit_input_value.trim().to_string()));
                editing_group.set(None);
            }
        })
    };

    let on_cancel_edit = {
        let editing_group = editing_group.clone();
        Callback::from(move |_| {
            editing_group.set(None);
        })
    };

    let on_edit_input = {
        let edit_input_value = edit_input_value.clone();
        Callback::from(move |e: InputEvent| {
            if let Some(input) = e.target_dyn_into::<HtmlInputElement>() {
                edit_input_value.set(input.value());
            }
        })
    };

    let on_recategorize = {
        let dispatch = dispatch.clone();
        Callback::from(move |(group_id, category): (String, String)| {
            dispatch.emit(Action::Recategorize(group_id, category));
        })
    };

    let on_sync = {
        let dispatch = dispatch.clone();
        Callback::from(move |_| {
            dispatch.emit(Action::SyncNow);
        })
    };

    let on_export = {
        let keeper = keeper.clone();
        Callback::from(move |_| {
            let keeper = keeper.clone();
            spawn_local(async move {
                let document = keeper.lock().await.export();
                match to_json(&document) {
                    Ok(json) => exportToFile(&json, &backup_filename(&document)),
                    Err(e) => alert(&format!("Export failed: {}", e)),
                }
            });
        })
    };

    let on_import = {
        let dispatch = dispatch.clone();
        Callback::from(move |e: Event| {
            let Some(input) = e.target_dyn_into::<HtmlInputElement>() else {
                return;
            };
            let Some(file) = input.files().and_then(|files| files.get(0)) else {
                return;
            };
            let dispatch = dispatch.clone();

            spawn_local(async move {
                let text = JsFuture::from(file.text())
                    .await
                    .ok()
                    .and_then(|text| text.as_string())
                    .unwrap_or_default();

                match parse_document(&text) {
                    Ok(document) => {
                        if confirm("Importing a backup replaces all current data. Continue?") {
                            dispatch.emit(Action::Import(document));
                        }
                    }
                    Err(e) => alert(&format!("Import failed: {}", e)),
                }
                input.set_value("");
            });
        })
    };

    let page_size = KeeperConfig::default().page_size;
    let view = snapshot.page(&query, page_size);
    let categories = snapshot.categories().all().to_vec();

    html! {
        <div class="container">
            <div class="header">
                <h1 class="main-title">{"Tab Keeper"}</h1>
                <span class="total-count">
                    {format!("{} tabs in {} groups", snapshot.total_tabs(), snapshot.group_count())}
                </span>
                <div class="header-actions">
                    <Button onclick={on_sync} variant={ButtonVariant::Secondary}>
                        {"☁️ Sync now"}
                    </Button>
                    <Button onclick={on_export} variant={ButtonVariant::Secondary}>
                        {"📥 Export"}
                    </Button>
                    <label class="import-label">
                        {"📤 Import"}
                        <input type="file" accept=".json,application/json" class="import-input" onchange={on_import} />
                    </label>
                </div>
            </div>

            // Status display
            {match &*state {
                ViewState::Loading => html! {
                    <div class="loading-text-center">
                        <Spinner />
                        <p class="loading-text">{"Loading groups..."}</p>
                    </div>
                },
                ViewState::Busy(msg) => html! {
                    <div class="message-container">
                        <Spinner />
                        <p class="message-text">{msg}</p>
                    </div>
                },
                ViewState::Error(err) => html! {
                    <Alert r#type={AlertType::Danger} title={"Error"} inline={true}>
                        {err.clone()}
                    </Alert>
                },
                ViewState::Idle => html! {}
            }}

            <div class="search-container">
                <input
                    type="text"
                    placeholder="Search titles and URLs..."
                    value={query.search.clone()}
                    oninput={on_search_input}
                    class="search-input"
                />
                if !query.search.trim().is_empty() {
                    <span class="search-count">{format!("{} groups match", view.matching)}</span>
                }
            </div>

            <div class="category-panel">
                <CategoryBar
                    categories={categories.clone()}
                    active={query.category.clone()}
                    on_select={on_select_category}
                />
                <div class="new-category">
                    <input
                        type="text"
                        placeholder="New category"
                        value={(*new_category).clone()}
                        oninput={on_new_category_input}
                        class="new-category-input"
                    />
                    <Button onclick={on_add_category} variant={ButtonVariant::Secondary}>
                        {"Add"}
                    </Button>
                </div>
            </div>

            if view.groups.is_empty() {
                <div class="empty-state">
                    if snapshot.group_count() == 0 {
                        <p>{"No saved tab groups yet."}</p>
                        <p class="empty-state-hint">{"Click the toolbar icon to save this window's tabs."}</p>
                    } else {
                        <p>{"No groups match."}</p>
                    }
                </div>
            } else {
                <div class="tab-groups-list">
                    {for view.groups.iter().map(|group| {
                        let is_editing = (*editing_group).as_ref() == Some(&group.id);

                        html! {
                            <GroupCard
                                key={group.id.clone()}
                                group={group.clone()}
                                categories={categories.clone()}
                                is_editing={is_editing}
                                edit_value={(*edit_input_value).clone()}
                                on_restore_all={on_restore_all.clone()}
                                on_delete={on_delete_group.clone()}
                                on_restore_tab={on_restore_tab.clone()}
                                on_delete_tab={on_delete_tab.clone()}
                                on_start_edit={on_start_edit.clone()}
                                on_save_edit={on_save_edit.clone()}
                                on_cancel_edit={on_cancel_edit.clone()}
                                on_edit_input={on_edit_input.clone()}
                                on_recategorize={on_recategorize.clone()}
                            />
                        }
                    })}
                </div>
            }

            <PaginationBar view={view.clone()} on_page={on_page} />
        </div>
    }
}
