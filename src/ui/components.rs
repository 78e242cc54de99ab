/// Reusable UI components

use web_sys::HtmlInputElement;
use yew::prelude::*;

use crate::registrar::StatusMessage;

#[derive(Properties, PartialEq)]
pub struct TextFieldProps {
    pub id: AttrValue,
    pub label: AttrValue,
    pub value: String,
    pub oninput: Callback<String>,
    #[prop_or(AttrValue::Static("text"))]
    pub input_type: AttrValue,
    #[prop_or(false)]
    pub disabled: bool,
}

#[function_component(TextField)]
pub fn text_field(props: &TextFieldProps) -> Html {
    let oninput = props.oninput.reform(|e: InputEvent| {
        e.target_dyn_into::<HtmlInputElement>()
            .map(|input| input.value())
            .unwrap_or_default()
    });

    html! {
        <div class="form-field">
            <label for={props.id.clone()}>{&props.label}</label>
            <input
                id={props.id.clone()}
                type={props.input_type.clone()}
                value={props.value.clone()}
                disabled={props.disabled}
                {oninput}
            />
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct StatusLineProps {
    #[prop_or_default]
    pub message: Option<StatusMessage>,
}

/// Colored one-line status; renders an empty line when there is no message.
#[function_component(StatusLine)]
pub fn status_line(props: &StatusLineProps) -> Html {
    let (text, color) = match &props.message {
        Some(message) => (message.text.clone(), message.tone.color()),
        None => (String::new(), "inherit"),
    };

    html! {
        <p class="status-line" style={format!("color: {};", color)}>{text}</p>
    }
}
