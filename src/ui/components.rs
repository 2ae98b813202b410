/// Reusable UI components

use crate::bulk::BulkKind;
use crate::directory::best_icon_url;
use crate::extension_data::ExtensionRecord;
use crate::summary::BulkSummary;
use patternfly_yew::prelude::*;
use web_sys::HtmlInputElement;
use yew::prelude::*;

#[derive(Properties, PartialEq)]
pub struct ExtensionRowProps {
    pub record: ExtensionRecord,
    #[prop_or(false)]
    pub is_self: bool,
    #[prop_or(false)]
    pub busy: bool,
    pub on_toggle: Callback<(String, bool)>,
}

#[function_component(ExtensionRow)]
pub fn extension_row(props: &ExtensionRowProps) -> Html {
    let record = &props.record;

    let onchange = {
        let id = record.id.clone();
        let current = record.enabled;
        let on_toggle = props.on_toggle.clone();

        Callback::from(move |e: Event| {
            if let Some(input) = e.target_dyn_into::<HtmlInputElement>() {
                let wanted = input.checked();
                // The checkbox follows the session, not the click
                input.set_checked(current);
                on_toggle.emit((id.clone(), wanted));
            }
        })
    };

    let mut row_class = classes!("extension-item");
    if !record.enabled {
        row_class.push("disabled");
    }
    if props.is_self {
        row_class.push("self");
    }

    html! {
        <div class={row_class} data-extension-id={record.id.clone()}>
            <img class="extension-icon" src={best_icon_url(record).to_string()} alt={record.name.clone()} />
            <div class="extension-info">
                <div class="extension-name">{&record.name}</div>
                <div class="extension-description">
                    {record.description_text().unwrap_or("No description")}
                </div>
            </div>
            <div class="extension-toggle">
                <label class="toggle-switch">
                    <input
                        type="checkbox"
                        checked={record.enabled}
                        disabled={!record.may_disable || props.busy}
                        {onchange}
                    />
                    <span class="slider"></span>
                </label>
            </div>
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct BulkControlProps {
    pub summary: BulkSummary,
    pub on_action: Callback<BulkKind>,
}

#[function_component(BulkControl)]
pub fn bulk_control(props: &BulkControlProps) -> Html {
    let working = props.summary == BulkSummary::Working;
    let loading = props.summary == BulkSummary::Preparing;

    let mut class = classes!("extension-item", "aggregate");
    if working {
        class.push("processing");
    }
    if loading {
        class.push("loading");
    }

    html! {
        <div {class}>
            <div class="aggregate-icon">{"∑"}</div>
            <div class="extension-info">
                <div class="extension-name">{"Active Group Switch"}</div>
                <div class="extension-description">{props.summary.description()}</div>
            </div>
            <div class="extension-toggle">
                if let Some((kind, label)) = props.summary.action() {
                    <Button
                        onclick={props.on_action.reform(move |_| kind)}
                        disabled={working}
                        variant={if kind == BulkKind::Restore { ButtonVariant::Secondary } else { ButtonVariant::Primary }}
                    >
                        {label}
                    </Button>
                }
            </div>
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct NoticeStackProps {
    pub notices: Vec<String>,
}

#[function_component(NoticeStack)]
pub fn notice_stack(props: &NoticeStackProps) -> Html {
    if props.notices.is_empty() {
        return html! {};
    }

    html! {
        <div class="notice-stack">
            {for props.notices.iter().map(|notice| html! {
                <Alert r#type={AlertType::Info} title={notice.clone()} inline={true}>
                </Alert>
            })}
        </div>
    }
}
