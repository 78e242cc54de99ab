/// Popup UI: register the user id and email with the backend

use std::time::Duration;

use patternfly_yew::prelude::*;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

use crate::chrome::connect_registrar;
use crate::config::STATUS_CLEAR_AFTER;
use crate::registrar::StatusMessage;
use crate::ui::components::{StatusLine, TextField};

#[function_component(App)]
pub fn app() -> Html {
    let user_id = use_state(String::new);
    let email = use_state(String::new);
    let status = use_state(|| None::<StatusMessage>);
    let saving = use_state(|| false);

    // Prefill from storage, then refresh the email from the backend
    {
        let user_id = user_id.clone();
        let email = email.clone();

        use_effect_with((), move |_| {
            spawn_local(async move {
                let registrar = connect_registrar().await;
                let stored = registrar.stored_identity().await;

                let Some(stored_id) = stored.user_id().map(str::to_string) else {
                    return;
                };
                user_id.set(stored_id.clone());
                if let Some(saved) = stored.email() {
                    email.set(saved.to_string());
                }

                if let Some(current) = registrar.refresh_email(&stored_id).await {
                    email.set(current);
                }
            });
            || ()
        });
    }

    let on_user_id_input = {
        let user_id = user_id.clone();
        Callback::from(move |value: String| user_id.set(value))
    };

    let on_email_input = {
        let email = email.clone();
        Callback::from(move |value: String| email.set(value))
    };

    let on_save = {
        let user_id = user_id.clone();
        let email = email.clone();
        let status = status.clone();
        let saving = saving.clone();

        Callback::from(move |_| {
            let form_user_id = (*user_id).clone();
            let form_email = (*email).clone();
            let status = status.clone();
            let saving = saving.clone();

            saving.set(true);

            spawn_local(async move {
                let registrar = connect_registrar().await;
                let outcome = registrar.submit(&form_user_id, &form_email).await;

                saving.set(false);
                show_status(&status, outcome.status);

                if let Some(delay) = outcome.close_after {
                    after(delay, close_popup);
                }
            });
        })
    };

    html! {
        <div class="padding-20">
            <h1 class="popup-title">{"Tab Activity Tracker"}</h1>

            <TextField
                id="userId"
                label="User ID"
                value={(*user_id).clone()}
                oninput={on_user_id_input}
                disabled={*saving}
            />
            <TextField
                id="email"
                label="Email"
                input_type="email"
                value={(*email).clone()}
                oninput={on_email_input}
                disabled={*saving}
            />

            <Button onclick={on_save} disabled={*saving} variant={ButtonVariant::Primary} block={true}>
                {"Save"}
            </Button>

            <StatusLine message={(*status).clone()} />
        </div>
    }
}

// Helper functions

/// Show a message and clear it again after a few seconds.
fn show_status(status: &UseStateHandle<Option<StatusMessage>>, message: StatusMessage) {
    status.set(Some(message));

    let status = status.clone();
    after(STATUS_CLEAR_AFTER, move || status.set(None));
}

fn after(delay: Duration, action: impl FnOnce() + 'static) {
    let Some(window) = web_sys::window() else {
        return;
    };

    let callback = Closure::once_into_js(action);
    let millis = i32::try_from(delay.as_millis()).unwrap_or(i32::MAX);

    if let Err(e) = window.set_timeout_with_callback_and_timeout_and_arguments_0(callback.unchecked_ref(), millis) {
        log::warn!("Failed to schedule timer: {:?}", e);
    }
}

fn close_popup() {
    if let Some(window) = web_sys::window() {
        if let Err(e) = window.close() {
            log::warn!("Failed to close popup: {:?}", e);
        }
    }
}
