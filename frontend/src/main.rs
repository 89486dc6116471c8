//! Terminal driver for the password-reset wizard.
//!
//! ```text
//! appartners-reset [--api-base-url URL] [--token-file PATH] [--email EMAIL] [-v]
//! ```
//!
//! On the verification-code step, `:resend` requests a new code once the
//! countdown has run out and `:back` returns to the previous step.

#[cfg(target_arch = "wasm32")]
fn main() {}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    terminal::run()
}

#[cfg(not(target_arch = "wasm32"))]
mod terminal {
    use std::{io::Write, path::PathBuf, rc::Rc, time::Duration};

    use anyhow::Context;
    use appartners_frontend::{
        api::ApiClient,
        config,
        pages::forgot_password::{
            flow::{Applied, FlowError, FlowExit, Navigation, NoticeKind, ResetStep},
            ForgotPasswordRepository, ResetWizard,
        },
        utils::{
            redact::mask_email,
            storage::{FileStorage, KeyValueStore, MemoryStorage},
        },
    };
    use clap::Parser;
    use env_logger::{Builder, WriteStyle};
    use log::LevelFilter;
    use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

    type Wizard = ResetWizard<ForgotPasswordRepository>;
    type Input = Lines<BufReader<Stdin>>;

    #[derive(Debug, Parser)]
    #[command(name = "appartners-reset", about = "Reset an Appartners account password")]
    struct Cli {
        /// Base URL of the authentication API
        #[arg(long, env = "APPARTNERS_API_BASE_URL")]
        api_base_url: Option<String>,

        /// Keep the reset token in this JSON file instead of memory
        #[arg(long)]
        token_file: Option<PathBuf>,

        /// Start with this email instead of prompting for it
        #[arg(long)]
        email: Option<String>,

        #[arg(short, long)]
        verbose: bool,
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub(super) enum Command {
        Back,
        Resend,
        Text(String),
    }

    pub(super) fn parse_command(line: &str) -> Command {
        match line.trim() {
            ":back" | ":b" => Command::Back,
            ":resend" | ":r" => Command::Resend,
            other => Command::Text(other.to_string()),
        }
    }

    fn init_logging(verbose: bool) {
        let level = if verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Warn
        };
        Builder::new()
            .filter_level(level)
            .parse_default_env()
            .format_timestamp_secs()
            .format_module_path(verbose)
            .write_style(WriteStyle::Auto)
            .init();
    }

    pub(super) fn run() -> anyhow::Result<()> {
        dotenvy::dotenv().ok();
        let cli = Cli::parse();
        init_logging(cli.verbose);

        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("failed to start async runtime")?
            .block_on(drive(cli))
    }

    async fn drive(cli: Cli) -> anyhow::Result<()> {
        if let Some(url) = cli.api_base_url.as_deref() {
            config::set_api_base_url(url);
        }
        config::init().await;

        let storage: Rc<dyn KeyValueStore> = match &cli.token_file {
            Some(path) => {
                let file = FileStorage::open(path)
                    .with_context(|| format!("cannot use token file {}", path.display()))?;
                log::info!("reset token kept in {}", file.path().display());
                Rc::new(file)
            }
            None => Rc::new(MemoryStorage::default()),
        };
        let repository =
            ForgotPasswordRepository::new_with_client(Rc::new(ApiClient::new()), storage);
        let mut wizard = ResetWizard::new(repository);
        let mut input = BufReader::new(tokio::io::stdin()).lines();

        if let Some(email) = cli.email.as_deref() {
            let outcome = wizard.submit_email(email).await;
            report(&mut wizard, Some(outcome));
        }

        while wizard.flow().exit().is_none() {
            let step = wizard.flow().step();
            let outcome = match step {
                ResetStep::Email => email_step(&mut wizard, &mut input).await?,
                ResetStep::Otp => otp_step(&mut wizard, &mut input).await?,
                ResetStep::NewPassword => password_step(&mut wizard).await?,
                ResetStep::Confirmation => {
                    println!("Your password has been reset.");
                    prompt("Press Enter to return to sign in.");
                    input.next_line().await?;
                    wizard.confirm();
                    continue;
                }
            };
            report(&mut wizard, outcome);
        }

        match wizard.flow().exit() {
            Some(FlowExit::Completed) => println!("You can now sign in with your new password."),
            _ => println!("Password reset cancelled."),
        }
        Ok(())
    }

    /// `None` means the user asked to leave the current step without
    /// submitting anything.
    async fn email_step(
        wizard: &mut Wizard,
        input: &mut Input,
    ) -> anyhow::Result<Option<Result<Applied, FlowError>>> {
        prompt("Email: ");
        let Some(line) = input.next_line().await? else {
            wizard.abandon();
            return Ok(None);
        };
        match parse_command(&line) {
            Command::Back => {
                wizard.back();
                Ok(None)
            }
            Command::Resend => Ok(Some(Err(FlowError::WrongStep(ResetStep::Email)))),
            Command::Text(email) => Ok(Some(wizard.submit_email(&email).await)),
        }
    }

    async fn otp_step(
        wizard: &mut Wizard,
        input: &mut Input,
    ) -> anyhow::Result<Option<Result<Applied, FlowError>>> {
        let email = mask_email(&wizard.flow().session().email);
        println!("Enter the 6-digit code sent to {email}.");
        print_countdown(wizard);
        prompt("Code: ");

        let mut ticker = tokio::time::interval(Duration::from_secs(1));
        // The first tick completes immediately.
        ticker.tick().await;

        let line = loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if wizard.tick() {
                        println!();
                        println!("You can now request a new code with :resend");
                        prompt("Code: ");
                    }
                }
                line = input.next_line() => break line?,
            }
        };

        let Some(line) = line else {
            wizard.abandon();
            return Ok(None);
        };
        Ok(match parse_command(&line) {
            Command::Back => {
                wizard.back();
                None
            }
            Command::Resend => Some(wizard.resend_code().await),
            Command::Text(code) => Some(wizard.submit_code(&code).await),
        })
    }

    async fn password_step(wizard: &mut Wizard) -> anyhow::Result<Option<Result<Applied, FlowError>>> {
        println!("Choose a new password (at least 8 characters with upper and lower case letters and a number).");
        println!("Type :back to re-enter the verification code.");
        let password = read_secret("New password: ").await?;
        if parse_command(&password) == Command::Back {
            if wizard.back() == Navigation::Moved(ResetStep::Otp) {
                println!("A new verification is required.");
            }
            return Ok(None);
        }
        let confirmation = read_secret("Confirm password: ").await?;
        Ok(Some(wizard.submit_new_password(&password, &confirmation).await))
    }

    async fn read_secret(label: &'static str) -> anyhow::Result<String> {
        let secret = tokio::task::spawn_blocking(move || rpassword::prompt_password(label))
            .await
            .context("password prompt task failed")?
            .context("failed to read password")?;
        Ok(secret)
    }

    fn report(wizard: &mut Wizard, outcome: Option<Result<Applied, FlowError>>) {
        match outcome {
            Some(Ok(Applied::Stale)) => log::debug!("response arrived for a step that is gone"),
            Some(Ok(_)) | None => {}
            Some(Err(FlowError::ResendLocked(seconds))) => {
                eprintln!("You can request a new code in {seconds} seconds.")
            }
            // Code errors are also raised as notices below.
            Some(Err(FlowError::Invalid { .. })) if wizard.flow().notice().is_some() => {}
            Some(Err(FlowError::Blocked(_))) => {}
            Some(Err(err)) => eprintln!("{err}"),
        }
        if let Some(notice) = wizard.flow().notice() {
            match notice.kind {
                NoticeKind::Error => eprintln!("Error: {}", notice.message),
                NoticeKind::Info => println!("{}", notice.message),
            }
            wizard.dismiss_notice();
        }
    }

    fn print_countdown(wizard: &Wizard) {
        let timer = wizard.flow().timer();
        if timer.is_counting() {
            println!("You can request a new code in {} seconds.", timer.remaining());
        } else if timer.can_resend() {
            println!("Didn't get it? Type :resend for a new code.");
        }
    }

    fn prompt(text: &str) {
        print!("{text}");
        let _ = std::io::stdout().flush();
    }
}
