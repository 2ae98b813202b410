/// Popup UI for Extension Switch

use std::cell::RefCell;
use std::rc::Rc;

use crate::bulk::{PopupSession, Request};
use crate::chrome::{self, ChromeManagement, ChromeStorage};
use crate::controller::PopupController;
use crate::directory::{enabled_stats, filter_extensions};
use crate::summary::BulkSummary;
use crate::ui::components::{BulkControl, ExtensionRow, NoticeStack};
use patternfly_yew::prelude::*;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::HtmlInputElement;
use yew::prelude::*;

/// How long a notice stays on screen
const NOTICE_DURATION_MS: i32 = 2000;

#[derive(Clone, PartialEq)]
enum AppState {
    Loading,
    Ready,
    Error(String),
}

fn controller() -> PopupController<ChromeManagement, ChromeStorage> {
    PopupController::new(ChromeManagement, ChromeStorage, &chrome::self_id())
}

/// Shows notices and hides them again unless newer ones replaced them
#[derive(Clone)]
struct Notifier {
    notices: UseStateHandle<Vec<String>>,
    generation: Rc<RefCell<u32>>,
}

impl Notifier {
    fn show(&self, messages: Vec<String>) {
        if messages.is_empty() {
            return;
        }

        let generation = {
            let mut current = self.generation.borrow_mut();
            *current = current.wrapping_add(1);
            *current
        };
        self.notices.set(messages);

        let notices = self.notices.clone();
        let latest = self.generation.clone();
        let hide = Closure::once_into_js(move || {
            if *latest.borrow() == generation {
                notices.set(Vec::new());
            }
        });

        if let Some(window) = web_sys::window() {
            if let Err(e) = window.set_timeout_with_callback_and_timeout_and_arguments_0(
                hide.unchecked_ref(),
                NOTICE_DURATION_MS,
            ) {
                log::warn!("Failed to schedule notice removal: {:?}", e);
            }
        }
    }
}

#[function_component(App)]
pub fn app() -> Html {
    let state = use_state(|| AppState::Loading);
    let session = use_mut_ref(|| PopupSession::new(&chrome::self_id()));
    let redraw = use_force_update();
    let search_query = use_state(String::new);
    let notices = use_state(Vec::<String>::new);
    let generation = use_mut_ref(|| 0u32);
    let notifier = Notifier { notices, generation };

    // Load extensions and the saved batch on mount
    {
        let state = state.clone();
        let session = session.clone();
        let redraw = redraw.clone();
        let notifier = notifier.clone();

        use_effect_with((), move |_| {
            spawn_local(async move {
                match controller().open().await {
                    Ok((loaded, warnings)) => {
                        *session.borrow_mut() = loaded;
                        state.set(AppState::Ready);
                        notifier.show(warnings.iter().map(|w| w.notice()).collect());
                    }
                    Err(e) => {
                        log::error!("Failed to load extensions: {}", e);
                        state.set(AppState::Error(format!("Failed to load: {}", e)));
                    }
                }
                redraw.force_update();
            });
            || ()
        });
    }

    let on_search_input = {
        let search_query = search_query.clone();
        Callback::from(move |e: InputEvent| {
            if let Some(input) = e.target_dyn_into::<HtmlInputElement>() {
                search_query.set(input.value());
            }
        })
    };

    // Every action is accepted on the live session, which stays `Processing`
    // until the result is written back
    let on_action = {
        let session = session.clone();
        let redraw = redraw.clone();
        let notifier = notifier.clone();

        Callback::from(move |request: Request| {
            let controller = controller();

            let accepted = {
                let mut live = session.borrow_mut();
                controller
                    .start(&mut live, request)
                    .map(|plan| (plan, live.clone()))
            };
            let (plan, in_flight) = match accepted {
                Ok(accepted) => accepted,
                Err(outcome) => {
                    notifier.show(outcome.notices());
                    return;
                }
            };
            redraw.force_update();

            let session = session.clone();
            let redraw = redraw.clone();
            let notifier = notifier.clone();
            spawn_local(async move {
                let (next, result) = controller.run(in_flight, plan).await;
                *session.borrow_mut() = next;
                redraw.force_update();
                notifier.show(result.notices());
            });
        })
    };
    let on_bulk = on_action.reform(Request::Bulk);
    let on_toggle = on_action.reform(|(id, enable): (String, bool)| Request::Toggle { id, enable });

    let current = session.borrow();
    let summary = BulkSummary::from_session(&current);
    let busy = current.is_processing();
    let visible = filter_extensions(&current.extensions, &search_query);
    let stats = enabled_stats(&current.extensions);
    let self_id = current.self_id.clone();
    drop(current);

    html! {
        <div class="padding-20">
            <h1 class="popup-title">{"Extension Switch"}</h1>

            <NoticeStack notices={(*notifier.notices).clone()} />

            <div class="search-container">
                <input
                    type="text"
                    placeholder="Search extensions..."
                    value={(*search_query).clone()}
                    oninput={on_search_input}
                    class="search-input"
                />
            </div>

            {match &*state {
                AppState::Loading => html! {
                    <div class="loading-text-center">
                        <Spinner />
                        <p class="loading-text">{"Loading extensions..."}</p>
                    </div>
                },
                AppState::Error(err) => html! {
                    <div class="message-top-margin">
                        <Alert r#type={AlertType::Danger} title={"Error"} inline={true}>
                            {err.clone()}
                        </Alert>
                    </div>
                },
                AppState::Ready => html! {}
            }}

            <div id="bulkControls">
                <BulkControl summary={summary} on_action={on_bulk} />
            </div>

            <div id="extensionsList">
                if visible.is_empty() {
                    <div class="no-results">{"No extensions found"}</div>
                } else {
                    {for visible.iter().map(|record| html! {
                        <ExtensionRow
                            key={record.id.clone()}
                            record={record.clone()}
                            is_self={record.id == self_id}
                            busy={busy}
                            on_toggle={on_toggle.clone()}
                        />
                    })}
                }
            </div>

            <p class="footer-popup" id="extensionCount">
                {stats}
            </p>
        </div>
    }
}
