/// Reusable UI components

use patternfly_yew::prelude::*;
use wasm_bindgen::JsValue;
use web_sys::HtmlSelectElement;
use yew::prelude::*;

use crate::store::{CategoryFilter, PageView};
use crate::tab_data::TabGroup;

const FALLBACK_ICON: &str = "data:image/svg+xml,<svg xmlns=%22http://www.w3.org/2000/svg%22 viewBox=%220 0 16 16%22><text y=%2214%22 font-size=%2214%22>🌐</text></svg>";

fn format_timestamp(timestamp: i64) -> String {
    let date = js_sys::Date::new(&JsValue::from_f64(timestamp as f64));
    format!(
        "{:04}-{:02}-{:02} {:02}:{:02}",
        date.get_full_year(),
        date.get_month() + 1,
        date.get_date(),
        date.get_hours(),
        date.get_minutes()
    )
}

#[derive(Properties, PartialEq)]
pub struct GroupCardProps {
    pub group: TabGroup,
    pub categories: Vec<String>,
    pub is_editing: bool,
    pub edit_value: String,
    pub on_restore_all: Callback<String>,
    pub on_delete: Callback<String>,
    pub on_restore_tab: Callback<(String, usize)>,
    pub on_delete_tab: Callback<(String, usize)>,
    pub on_start_edit: Callback<(String, String)>,
    pub on_save_edit: Callback<()>,
    pub on_cancel_edit: Callback<()>,
    pub on_edit_input: Callback<InputEvent>,
    pub on_recategorize: Callback<(String, String)>,
}

#[function_component(GroupCard)]
pub fn group_card(props: &GroupCardProps) -> Html {
    let group = &props.group;

    let on_category_change = {
        let group_id = group.id.clone();
        props.on_recategorize.reform(move |e: Event| {
            let value = e
                .target_dyn_into::<HtmlSelectElement>()
                .map(|select| select.value())
                .unwrap_or_default();
            (group_id.clone(), value)
        })
    };

    html! {
        <div class="tab-group">
            <div class="group-header">
                <div class="group-info">
                    if props.is_editing {
                        <div class="group-title-edit-mode">
                            <input
                                type="text"
                                value={props.edit_value.clone()}
                                oninput={props.on_edit_input.clone()}
                                class="group-title-input"
                            />
                            <Button onclick={props.on_save_edit.reform(|_| ())}>
                                {"✓"}
                            </Button>
                            <Button
                                onclick={props.on_cancel_edit.reform(|_| ())}
                                variant={ButtonVariant::Secondary}
                            >
                                {"✗"}
                            </Button>
                        </div>
                    } else {
                        <span
                            class={if group.title.is_empty() { "group-title empty" } else { "group-title" }}
                            onclick={props.on_start_edit.reform({
                                let group_id = group.id.clone();
                                let title = group.title.clone();
                                move |_| (group_id.clone(), title.clone())
                            })}
                        >
                            {if group.title.is_empty() { "Click to add a title" } else { group.title.as_str() }}
                        </span>
                    }
                    <select class="group-category" onchange={on_category_change}>
                        {for props.categories.iter().map(|name| html! {
                            <option value={name.clone()} selected={*name == group.category}>
                                {name}
                            </option>
                        })}
                        if !props.categories.contains(&group.category) {
                            <option value={group.category.clone()} selected={true}>
                                {&group.category}
                            </option>
                        }
                    </select>
                    <span class="group-meta">
                        {format!("{} • {} tabs", format_timestamp(group.created_at), group.tabs.len())}
                    </span>
                </div>
                <div class="group-actions">
                    <Button
                        onclick={props.on_restore_all.reform({
                            let group_id = group.id.clone();
                            move |_| group_id.clone()
                        })}
                    >
                        {"Restore all"}
                    </Button>
                    <Button
                        onclick={props.on_delete.reform({
                            let group_id = group.id.clone();
                            move |_| group_id.clone()
                        })}
                        variant={ButtonVariant::Danger}
                    >
                        {"Delete"}
                    </Button>
                </div>
            </div>

            <ul class="tab-list">
                {for group.tabs.iter().enumerate().map(|(index, tab)| {
                    let restore_key = (group.id.clone(), index);
                    let delete_key = (group.id.clone(), index);
                    let on_delete_tab = props.on_delete_tab.clone();
                    let icon = tab.fav_icon_url.clone().filter(|u| !u.is_empty()).unwrap_or_else(|| FALLBACK_ICON.to_string());

                    html! {
                        <li
                            key={format!("{}-{}", index, tab.url)}
                            class="tab-item"
                            onclick={props.on_restore_tab.reform(move |_| restore_key.clone())}
                        >
                            <img class="tab-favicon" src={icon} />
                            <span class="tab-title" title={tab.url.clone()}>{&tab.title}</span>
                            <button
                                class="tab-delete"
                                onclick={Callback::from(move |e: MouseEvent| {
                                    e.stop_propagation();
                                    on_delete_tab.emit(delete_key.clone());
                                })}
                            >
                                {"Delete"}
                            </button>
                        </li>
                    }
                })}
            </ul>
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct CategoryBarProps {
    pub categories: Vec<String>,
    pub active: CategoryFilter,
    pub on_select: Callback<CategoryFilter>,
}

#[function_component(CategoryBar)]
pub fn category_bar(props: &CategoryBarProps) -> Html {
    let item = |label: String, filter: CategoryFilter| {
        let class = if props.active == filter { "category-item active" } else { "category-item" };
        html! {
            <button class={class} onclick={props.on_select.reform(move |_| filter.clone())}>
                {label}
            </button>
        }
    };

    html! {
        <div class="category-list">
            {item("All".to_string(), CategoryFilter::All)}
            {for props.categories.iter().map(|name| item(name.clone(), CategoryFilter::Named(name.clone())))}
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct PaginationBarProps {
    pub view: PageView,
    pub on_page: Callback<usize>,
}

#[function_component(PaginationBar)]
pub fn pagination_bar(props: &PaginationBarProps) -> Html {
    let view = &props.view;
    if view.total_pages <= 1 {
        return html! {};
    }

    let prev = view.page - 1;
    let next = view.page + 1;

    html! {
        <div class="pagination">
            <Button
                onclick={props.on_page.reform(move |_| prev)}
                disabled={!view.has_prev()}
                variant={ButtonVariant::Secondary}
            >
                {"Previous"}
            </Button>
            <span class="page-info">{format!("Page {} / {}", view.page, view.total_pages)}</span>
            <Button
                onclick={props.on_page.reform(move |_| next)}
                disabled={!view.has_next()}
                variant={ButtonVariant::Secondary}
            >
                {"Next"}
            </Button>
        </div>
    }
}
