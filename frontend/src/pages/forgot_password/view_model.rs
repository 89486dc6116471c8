use super::{
    flow::{Applied, Navigation, NoticeKind, ResetFlow, ResetStep},
    repository::{ForgotPasswordRepository, VerificationApi},
    utils::MessageState,
};
use crate::{
    api::ApiClient,
    utils::storage::{self, KeyValueStore},
};
use leptos::*;
use std::rc::Rc;

pub const LOGIN_PATH: &str = "/login";

#[derive(Clone)]
pub struct ForgotPasswordViewModel {
    pub email: RwSignal<String>,
    pub otp_code: RwSignal<String>,
    pub password: RwSignal<String>,
    pub confirmation: RwSignal<String>,
    pub flow: RwSignal<ResetFlow>,
    pub messages: MessageState,
    pub email_action: Action<String, ()>,
    pub verify_action: Action<String, ()>,
    pub resend_action: Action<(), ()>,
    pub reset_action: Action<(String, String), ()>,
    repository: ForgotPasswordRepository,
}

pub fn use_forgot_password_view_model() -> ForgotPasswordViewModel {
    let api = use_context::<ApiClient>().unwrap_or_else(ApiClient::new);
    let store = use_context::<Rc<dyn KeyValueStore>>().unwrap_or_else(storage::default_store);
    let repository = ForgotPasswordRepository::new_with_client(Rc::new(api), store);

    let email = create_rw_signal(String::new());
    let otp_code = create_rw_signal(String::new());
    let password = create_rw_signal(String::new());
    let confirmation = create_rw_signal(String::new());
    let flow = create_rw_signal(ResetFlow::new());
    let messages = MessageState::default();

    // Each action validates synchronously on dispatch; a rejected submission
    // never produces a future that touches the network.
    let repo_for_email = repository.clone();
    let email_action = create_action(move |value: &String| {
        let repo = repo_for_email.clone();
        let submission = flow.try_update(|f| f.begin_email(value)).and_then(Result::ok);
        sync_messages(flow, messages);
        async move {
            let Some(submission) = submission else {
                return;
            };
            let result = repo.request_code(&submission.email).await;
            flow.try_update(|f| f.finish_email(submission, result));
            sync_messages(flow, messages);
        }
    });

    let repo_for_verify = repository.clone();
    let verify_action = create_action(move |value: &String| {
        let repo = repo_for_verify.clone();
        let submission = flow.try_update(|f| f.begin_verify(value)).and_then(Result::ok);
        sync_messages(flow, messages);
        async move {
            let Some(submission) = submission else {
                return;
            };
            let result = repo.verify_code(&submission.email, &submission.code).await;
            let applied = flow.try_update(|f| f.finish_verify(submission, result));
            if applied == Some(Applied::Stale) {
                log::debug!("dropped verification response for a closed step");
            }
            sync_messages(flow, messages);
        }
    });

    let repo_for_resend = repository.clone();
    let resend_action = create_action(move |_: &()| {
        let repo = repo_for_resend.clone();
        let submission = flow.try_update(|f| f.begin_resend()).and_then(Result::ok);
        sync_messages(flow, messages);
        async move {
            let Some(submission) = submission else {
                return;
            };
            let result = repo.request_code(&submission.email).await;
            flow.try_update(|f| f.finish_resend(submission, result));
            sync_messages(flow, messages);
        }
    });

    let repo_for_reset = repository.clone();
    let reset_action = create_action(move |(new_password, confirm): &(String, String)| {
        let repo = repo_for_reset.clone();
        let submission = flow
            .try_update(|f| f.begin_reset(new_password, confirm))
            .and_then(Result::ok);
        sync_messages(flow, messages);
        async move {
            let Some(submission) = submission else {
                return;
            };
            let result = repo
                .reset_password(&submission.new_password, &submission.reset_token)
                .await;
            let applied = flow.try_update(|f| f.finish_reset(submission, result));
            if applied == Some(Applied::Advanced(ResetStep::Confirmation)) {
                repo.discard_reset_token();
                password.set(String::new());
                confirmation.set(String::new());
            }
            sync_messages(flow, messages);
        }
    });

    #[cfg(target_arch = "wasm32")]
    drive_countdown(flow);

    ForgotPasswordViewModel {
        email,
        otp_code,
        password,
        confirmation,
        flow,
        messages,
        email_action,
        verify_action,
        resend_action,
        reset_action,
        repository,
    }
}

impl ForgotPasswordViewModel {
    pub fn step(&self) -> ResetStep {
        self.flow.with(|f| f.step())
    }

    pub fn submit(&self) {
        match self.step() {
            ResetStep::Email => self.email_action.dispatch(self.email.get_untracked()),
            ResetStep::Otp => self.verify_action.dispatch(self.otp_code.get_untracked()),
            ResetStep::NewPassword => self.reset_action.dispatch((
                self.password.get_untracked(),
                self.confirmation.get_untracked(),
            )),
            ResetStep::Confirmation => self.confirm(),
        }
    }

    pub fn resend(&self) {
        if self.flow.with_untracked(|f| f.can_resend()) {
            self.resend_action.dispatch(());
        }
    }

    pub fn is_busy(&self) -> bool {
        self.flow.with(|f| f.is_submitting())
    }

    pub fn resend_enabled(&self) -> bool {
        self.flow.with(|f| f.can_resend())
    }

    pub fn seconds_until_resend(&self) -> u32 {
        self.flow.with(|f| f.timer().remaining())
    }

    pub fn field_error(&self) -> Option<String> {
        self.flow
            .with(|f| f.field_error().map(|e| e.message.clone()))
    }

    pub fn dismiss_notice(&self) {
        self.flow.update(|f| f.dismiss_notice());
        self.messages.clear();
    }

    /// Returns to the previous step, clearing that step's inputs.
    pub fn go_back(&self) -> Navigation {
        let navigation = self
            .flow
            .try_update(|f| f.back())
            .unwrap_or(Navigation::Ignored);
        match navigation {
            Navigation::Moved(ResetStep::Email) => self.otp_code.set(String::new()),
            Navigation::Moved(_) => {
                self.otp_code.set(String::new());
                self.password.set(String::new());
                self.confirmation.set(String::new());
            }
            Navigation::Exited => self.navigate(LOGIN_PATH),
            Navigation::Ignored => {}
        }
        if navigation != Navigation::Ignored {
            self.repository.discard_reset_token();
            self.messages.clear();
        }
        navigation
    }

    pub fn confirm(&self) {
        if self.flow.try_update(|f| f.confirm()).unwrap_or(false) {
            self.navigate(LOGIN_PATH);
        }
    }

    fn navigate(&self, path: &str) {
        #[cfg(target_arch = "wasm32")]
        {
            if let Some(window) = web_sys::window() {
                let _ = window.location().set_href(path);
            }
        }
        #[cfg(not(target_arch = "wasm32"))]
        {
            log::debug!("navigation to {} requested", path);
        }
    }
}

fn sync_messages(flow: RwSignal<ResetFlow>, messages: MessageState) {
    match flow.with_untracked(|f| f.notice().cloned()) {
        Some(notice) if notice.kind == NoticeKind::Error => messages.set_error(notice.message),
        Some(notice) => messages.set_success(notice.message),
        None => messages.clear(),
    }
}

/// Ticks the resend countdown once per second while the OTP step counts
/// down. The interval lives in the owner's `StoredValue`, so it is dropped
/// (and cancelled) when the step leaves or the view model is disposed.
#[cfg(target_arch = "wasm32")]
fn drive_countdown(flow: RwSignal<ResetFlow>) {
    use gloo_timers::callback::Interval;

    let ticker = store_value(None::<Interval>);
    create_effect(move |_| {
        let counting = flow.with(|f| f.step() == ResetStep::Otp && f.timer().is_counting());
        if !counting {
            ticker.set_value(None);
        } else if ticker.with_value(Option::is_none) {
            ticker.set_value(Some(Interval::new(1_000, move || {
                flow.try_update(|f| f.tick());
            })));
        }
    });
}
