/// Manager page: every window grouped by domain, plus saved windows

use std::cell::Cell;
use std::rc::Rc;

use patternfly_yew::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::HtmlInputElement;
use yew::prelude::*;

use crate::bridge::{ChromeBrowser, ChromeStorage, TabWatch};
use crate::commands::{Command, Response, TabManager};
use crate::config::Config;
use crate::domain::{count_domains, top_domains};
use crate::error::BridgeError;
use crate::grouping::{DomainGroup, WindowView, group_by_domain_with_min};
use crate::operations::SortKey;
use crate::tab_data::{SavedWindow, Tab};

type ChromeManager = TabManager<ChromeBrowser, ChromeStorage>;

/// A command plus the status line shown while it runs
type Run = Callback<(Command, &'static str)>;

#[derive(Clone, PartialEq)]
enum ViewState {
    Idle,
    Loading(String),
    Notice(String),
    Error(String),
}

/// Bumped to reload windows and saved windows
#[derive(Debug, Default, PartialEq)]
struct Generation(u32);

impl Reducible for Generation {
    type Action = ();

    fn reduce(self: Rc<Self>, _: ()) -> Rc<Self> {
        Rc::new(Generation(self.0.wrapping_add(1)))
    }
}

/// Numbers searches so a slow response cannot overwrite a newer one
#[derive(Debug, Default)]
struct SearchSequence(Cell<u64>);

impl SearchSequence {
    fn next(&self) -> u64 {
        let ticket = self.0.get() + 1;
        self.0.set(ticket);
        ticket
    }

    fn is_latest(&self, ticket: u64) -> bool {
        self.0.get() == ticket
    }
}

#[derive(Properties, PartialEq)]
pub struct DashboardProps {
    pub config: Config,
}

#[function_component(Dashboard)]
pub fn dashboard(props: &DashboardProps) -> Html {
    let manager = use_memo(props.config.clone(), |config| {
        ChromeManager::new(ChromeBrowser, ChromeStorage, config.clone(), js_sys::Date::now)
    });
    let state = use_state(|| ViewState::Loading("Loading windows...".to_string()));
    let windows = use_state(Vec::<WindowView>::new);
    let saved = use_state(Vec::<SavedWindow>::new);
    let search_query = use_state(String::new);
    let search_results = use_state(Vec::<Tab>::new);
    let sort_key = use_state(|| manager.sort_key());
    let generation = use_reducer(Generation::default);
    let searches = use_memo((), |_| SearchSequence::default());

    // Reload whenever tabs or windows change outside the dashboard
    {
        let refresh = generation.dispatcher();
        use_effect_with((), move |_| {
            let watch = TabWatch::new(move || refresh.dispatch(()));
            move || drop(watch)
        });
    }

    // Reload whenever a command finishes
    {
        let manager = manager.clone();
        let state = state.clone();
        let windows = windows.clone();
        let saved = saved.clone();

        use_effect_with(generation.0, move |_| {
            spawn_local(async move {
                match load(&manager).await {
                    Ok((views, stored)) => {
                        windows.set(views);
                        saved.set(stored);
                        if matches!(*state, ViewState::Loading(_)) {
                            state.set(ViewState::Idle);
                        }
                    }
                    Err(e) => {
                        windows.set(Vec::new());
                        state.set(ViewState::Error(format!("Failed to load windows: {}", e)));
                    }
                }
            });
            || ()
        });
    }

    let run: Run = {
        let manager = manager.clone();
        let state = state.clone();
        let generation = generation.dispatcher();

        Callback::from(move |(command, message): (Command, &'static str)| {
            let manager = manager.clone();
            let state = state.clone();
            let generation = generation.clone();

            state.set(ViewState::Loading(message.to_string()));

            spawn_local(async move {
                match manager.dispatch(command).await {
                    Ok(response) => {
                        state.set(describe(&response).map_or(ViewState::Idle, ViewState::Notice));
                        generation.dispatch(());
                    }
                    Err(e) => {
                        state.set(ViewState::Error(format!("{} failed: {}", message.trim_end_matches("..."), e)));
                    }
                }
            });
        })
    };

    let on_search_input = {
        let manager = manager.clone();
        let searches = searches.clone();
        let search_query = search_query.clone();
        let search_results = search_results.clone();

        Callback::from(move |e: InputEvent| {
            let Some(input) = e.target_dyn_into::<HtmlInputElement>() else {
                return;
            };
            let query = input.value();
            search_query.set(query.clone());
            let ticket = searches.next();

            let manager = manager.clone();
            let searches = searches.clone();
            let search_results = search_results.clone();
            spawn_local(async move {
                match manager.dispatch(Command::SearchTabs { query }).await {
                    Ok(Response::Tabs(tabs)) if searches.is_latest(ticket) => search_results.set(tabs),
                    Ok(_) => {}
                    Err(e) => log::warn!("Search failed: {}", e),
                }
            });
        })
    };

    let on_sort_key = {
        let manager = manager.clone();
        let sort_key = sort_key.clone();

        move |key: SortKey| {
            let manager = manager.clone();
            let sort_key = sort_key.clone();
            Callback::from(move |_| {
                let manager = manager.clone();
                sort_key.set(key);
                spawn_local(async move {
                    if let Err(e) = manager.dispatch(Command::SetSortKey { key }).await {
                        log::warn!("Setting sort key failed: {}", e);
                    }
                });
            })
        }
    };

    let is_busy = matches!(*state, ViewState::Loading(_));
    let min_group_size = manager.config().min_group_size;

    let all_tabs: Vec<Tab> = windows
        .iter()
        .flat_map(|view| view.groups.iter())
        .flat_map(|group| group.tabs.iter().cloned())
        .collect();
    let top = top_domains(&count_domains(&all_tabs), 5);
    let window_count = windows.len();

    let command_button = |label: &'static str, command: Command, message: &'static str| {
        html! {
            <Button
                onclick={run.reform(move |_| (command.clone(), message))}
                disabled={is_busy}
                variant={ButtonVariant::Secondary}
            >
                {label}
            </Button>
        }
    };

    html! {
        <div class="container">
            <div class="header">
                <h1 class="main-title">{"Tab Atlas"}</h1>
                <span class="window-count">
                    {format!("{} window{} • {} tabs", window_count, if window_count == 1 { "" } else { "s" }, all_tabs.len())}
                </span>
            </div>

            <div class="toolbar">
                {command_button("Sort All Windows", Command::SortAllWindows, "Sorting tabs...")}
                {command_button("Remove Duplicates", Command::RemoveDuplicates, "Removing duplicates...")}
                {command_button("Merge Windows", Command::MergeAllWindows, "Merging windows...")}
                {command_button("Save Current Window", Command::SaveWindow { window_id: None, name: None }, "Saving window...")}
                <div class="sort-keys">
                    {for [(SortKey::Domain, "Domain"), (SortKey::Title, "Title"), (SortKey::Url, "URL")].into_iter().map(|(key, label)| html! {
                        <button
                            class={if *sort_key == key { "sort-key active" } else { "sort-key" }}
                            onclick={on_sort_key(key)}
                        >
                            {label}
                        </button>
                    })}
                </div>
            </div>

            // Status display
            {match &*state {
                ViewState::Loading(msg) => html! {
                    <div class="loading-text-center">
                        <Spinner />
                        <p class="loading-text">{msg}</p>
                    </div>
                },
                ViewState::Notice(msg) => html! {
                    <Alert r#type={AlertType::Info} title={msg.clone()} inline={true}>
                    </Alert>
                },
                ViewState::Error(err) => html! {
                    <Alert r#type={AlertType::Danger} title={"Error"} inline={true}>
                        {err.clone()}
                    </Alert>
                },
                ViewState::Idle => html! {}
            }}

            if !top.is_empty() {
                <div class="stats-box">
                    {for top.iter().map(|(domain, count)| html! {
                        <span class="stat-item">{format!("{} ({})", domain, count)}</span>
                    })}
                </div>
            }

            <div class="search-container">
                <input
                    type="text"
                    placeholder="Search open tabs..."
                    value={(*search_query).clone()}
                    oninput={on_search_input}
                    class="search-input"
                />
                if !search_query.trim().is_empty() {
                    <div class="search-results">
                        if search_results.is_empty() {
                            <div class="empty-state">{"No matching tabs found"}</div>
                        } else {
                            {for search_results.iter().map(|tab| html! {
                                <TabItem key={tab.id.to_string()} tab={tab.clone()} run={run.clone()} />
                            })}
                        }
                    </div>
                }
            </div>

            if windows.is_empty() {
                <div class="empty-state">
                    <h3>{"No windows open"}</h3>
                    <p>{"Your active windows will appear here"}</p>
                </div>
            } else {
                <div class="windows-list">
                    {for windows.iter().enumerate().map(|(index, view)| html! {
                        <WindowCard key={view.window_id.to_string()} position={index + 1} view={view.clone()} run={run.clone()} />
                    })}
                </div>
            }

            <h2 class="section-title">{"Saved Windows"}</h2>
            if saved.is_empty() {
                <div class="empty-state">{"No saved windows yet"}</div>
            } else {
                <div class="sessions-list">
                    {for saved.iter().map(|window| html! {
                        <SavedWindowCard key={window.id.to_string()} window={window.clone()} {min_group_size} run={run.clone()} />
                    })}
                </div>
            }
        </div>
    }
}

async fn load(manager: &ChromeManager) -> Result<(Vec<WindowView>, Vec<SavedWindow>), BridgeError> {
    let Response::Dashboard(views) = manager.dispatch(Command::GetDashboard).await? else {
        return Err(BridgeError::decode("dashboard", "unexpected response"));
    };
    let Response::SavedWindows(stored) = manager.dispatch(Command::GetSavedWindows).await? else {
        return Err(BridgeError::decode("saved windows", "unexpected response"));
    };
    Ok((views, stored))
}

fn describe(response: &Response) -> Option<String> {
    let plural = |n: usize| if n == 1 { "" } else { "s" };
    match response {
        Response::Removed(report) if report.applied > 0 => {
            Some(format!("Closed {} tab{}", report.applied, plural(report.applied)))
        }
        Response::Moved(report) if report.failed > 0 => Some(format!(
            "Moved {} tab{}, {} could not be moved",
            report.applied,
            plural(report.applied),
            report.failed
        )),
        Response::Saved(window) => Some(format!("Saved \"{}\"", window.name)),
        _ => None,
    }
}

/// A real host may be named "other", so the catch-all needs a key no host can have
fn group_key<T>(group: &DomainGroup<T>) -> String {
    if group.is_catch_all() {
        "#other".to_string()
    } else {
        group.domain.to_string()
    }
}

#[derive(Properties, PartialEq)]
struct WindowCardProps {
    position: usize,
    view: WindowView,
    run: Run,
}

#[function_component(WindowCard)]
fn window_card(props: &WindowCardProps) -> Html {
    let view = &props.view;
    let window_id = view.window_id;

    html! {
        <div class={if view.focused { "window-card focused" } else { "window-card" }}>
            <div class="window-header">
                <div class="window-title">{format!("Window {}", props.position)}</div>
                <div class="window-meta">
                    <span class="tab-count">{format!("{} tabs", view.tab_count)}</span>
                    <Button
                        onclick={props.run.reform(move |_| (Command::SaveWindow { window_id: Some(window_id), name: None }, "Saving window..."))}
                        variant={ButtonVariant::Secondary}
                    >
                        {"Save"}
                    </Button>
                </div>
            </div>
            <div class="tabs-container">
                {for view.groups.iter().map(|group| html! {
                    <DomainGroupCard key={group_key(group)} group={group.clone()} run={props.run.clone()} />
                })}
            </div>
        </div>
    }
}

#[derive(Properties, PartialEq)]
struct DomainGroupCardProps {
    group: DomainGroup,
    run: Run,
}

#[function_component(DomainGroupCard)]
fn domain_group_card(props: &DomainGroupCardProps) -> Html {
    let expanded = use_state(|| true);
    let group = &props.group;

    let toggle = {
        let expanded = expanded.clone();
        Callback::from(move |_| expanded.set(!*expanded))
    };

    let on_close_all = {
        let run = props.run.clone();
        let tab_ids: Vec<i32> = group.tabs.iter().map(|tab| tab.id).collect();
        Callback::from(move |e: MouseEvent| {
            e.stop_propagation();
            run.emit((Command::CloseTabs { tab_ids: tab_ids.clone() }, "Closing tabs..."));
        })
    };

    let icon = group
        .tabs
        .first()
        .and_then(|tab| tab.fav_icon_url.clone())
        .filter(|_| !group.is_catch_all());

    html! {
        <div class="domain-group">
            <div class="domain-group-header" onclick={toggle}>
                <div class="domain-info">
                    if let Some(src) = icon {
                        <img class="domain-favicon" {src} />
                    } else {
                        <div class="domain-icon-placeholder">
                            {if group.is_catch_all() { "📂" } else { "🌐" }}
                        </div>
                    }
                    <span class="domain-name">{group.domain.to_string()}</span>
                </div>
                <span class="domain-tab-count">{format!("({})", group.tabs.len())}</span>
                <button class="domain-close-all" title="Close all tabs in this group" onclick={on_close_all}>
                    {"✕"}
                </button>
                <span class="expand-indicator">{if *expanded { "▼" } else { "▶" }}</span>
            </div>
            if *expanded {
                <div class="domain-tabs-list">
                    {for group.tabs.iter().map(|tab| html! {
                        <TabItem key={tab.id.to_string()} tab={tab.clone()} run={props.run.clone()} />
                    })}
                </div>
            }
        </div>
    }
}

#[derive(Properties, PartialEq)]
struct TabItemProps {
    tab: Tab,
    run: Run,
}

#[function_component(TabItem)]
fn tab_item(props: &TabItemProps) -> Html {
    let tab = &props.tab;
    let (tab_id, window_id) = (tab.id, tab.window_id);

    let on_focus = props
        .run
        .reform(move |_: MouseEvent| (Command::FocusTab { tab_id, window_id }, "Switching tab..."));

    let on_close = {
        let run = props.run.clone();
        Callback::from(move |e: MouseEvent| {
            e.stop_propagation();
            run.emit((Command::CloseTab { tab_id }, "Closing tab..."));
        })
    };

    html! {
        <div class="tab-item" onclick={on_focus} title={tab.url.clone()}>
            <div class="tab-favicon">
                if let Some(src) = tab.fav_icon_url.clone() {
                    <img {src} />
                } else {
                    {"🌐"}
                }
            </div>
            <div class="tab-title">{tab.display_title()}</div>
            <div class="tab-indicators">
                if tab.pinned {
                    <div class="indicator pinned"></div>
                }
                if tab.audible {
                    <div class={if tab.muted { "indicator muted" } else { "indicator audio" }}></div>
                }
                <button class="tab-close-btn" title="Close tab" onclick={on_close}>{"✕"}</button>
            </div>
        </div>
    }
}

#[derive(Properties, PartialEq)]
struct SavedWindowCardProps {
    window: SavedWindow,
    min_group_size: usize,
    run: Run,
}

#[function_component(SavedWindowCard)]
fn saved_window_card(props: &SavedWindowCardProps) -> Html {
    let expanded = use_state(|| false);
    let window = &props.window;
    let window_id = window.id;

    let toggle = {
        let expanded = expanded.clone();
        Callback::from(move |_| expanded.set(!*expanded))
    };

    let groups = if *expanded {
        group_by_domain_with_min(&window.tabs, props.min_group_size)
    } else {
        Vec::new()
    };

    html! {
        <div class="session-card">
            <div class="session-header">
                <div class="session-title-container" onclick={toggle}>
                    <h3 class="session-title">{&window.name}</h3>
                    <p class="session-date">{format!("{} tabs", window.tabs.len())}</p>
                </div>
                <div class="session-actions">
                    <Button onclick={props.run.reform(move |_| (Command::RestoreWindow { window_id }, "Restoring window..."))}>
                        {"Restore"}
                    </Button>
                    <Button
                        onclick={props.run.reform(move |_| (Command::DeleteWindow { window_id }, "Deleting saved window..."))}
                        variant={ButtonVariant::Danger}
                    >
                        {"Delete"}
                    </Button>
                </div>
            </div>
            if *expanded {
                <div class="tabs-container">
                    {for groups.iter().map(|group| html! {
                        <div key={group_key(group)} class="domain-group">
                            <h4 class="domain-title">{format!("{} ({})", group.domain, group.tabs.len())}</h4>
                            <div class="tabs-list">
                                {for group.tabs.iter().map(|tab| html! {
                                    <div class="tab-item">
                                        <div class="tab-title">
                                            {if tab.pinned { "📌 " } else { "" }}
                                            {if tab.title.is_empty() { &tab.url } else { &tab.title }}
                                        </div>
                                        <div class="tab-url">{&tab.url}</div>
                                    </div>
                                })}
                            </div>
                        </div>
                    })}
                </div>
            }
        </div>
    }
}
