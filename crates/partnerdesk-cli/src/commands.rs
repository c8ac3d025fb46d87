//! Command handlers shared by one-shot invocations and the shell.

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use partnerdesk_core::account::{self, PasswordResetForm, RegistrationForm};
use partnerdesk_core::auth::{
    CredentialStore, NoticeLevel, Route, SessionEvent, SessionManager, SessionState,
    ACCESS_TOKEN_KEY,
};
use partnerdesk_core::cache::CacheManager;
use partnerdesk_core::dashboard::{self, Dashboard, OnboardingForm};
use partnerdesk_core::models::{LoginRequest, ProfileUpdate, User};
use partnerdesk_core::utils::{format_currency, format_optional_date, truncate_string};
use partnerdesk_core::{ApiClient, Config, PortalError};

use crate::cli::{CodesAction, OnboardArgs, PortalCommand, ProfileAction};

/// Column width for titles and descriptions in listings
const LIST_WIDTH: usize = 48;

/// Everything a command needs: the session, its event stream, config and cache.
pub struct App {
    pub config: Config,
    pub session: SessionManager,
    pub events: mpsc::Receiver<SessionEvent>,
    cache: Option<CacheManager>,
}

impl App {
    pub fn new(config: Config, api_url: Option<String>) -> Result<Self> {
        let data_dir = config.data_dir()?;
        let credentials = Arc::new(
            CredentialStore::open(&data_dir, config.credential_backend)
                .context("Failed to open credential store")?,
        );

        let base_url = api_url.unwrap_or_else(|| config.resolve_api_base_url());
        let api = ApiClient::new(&base_url, Arc::clone(&credentials))?;
        let (session, events) = SessionManager::new(Arc::new(api), credentials);

        // Offline display is optional; a broken cache dir only costs that.
        let cache = match config.cache_dir().and_then(CacheManager::new) {
            Ok(cache) => Some(cache),
            Err(e) => {
                warn!(error = %e, "Dashboard cache unavailable");
                None
            }
        };

        Ok(Self {
            config,
            session,
            events,
            cache,
        })
    }

    /// Print queued session notices. Returns true if the session asked to go
    /// back to the login screen.
    pub fn flush_events(&mut self) -> bool {
        let mut to_login = false;
        while let Ok(event) = self.events.try_recv() {
            to_login |= self.show_event(event);
        }
        to_login
    }

    pub fn show_event(&self, event: SessionEvent) -> bool {
        match event {
            SessionEvent::Notice(notice) => match notice.level {
                NoticeLevel::Success => println!("{}", notice.message),
                NoticeLevel::Error => eprintln!("{}", notice.message),
            },
            SessionEvent::Navigate(route) => {
                debug!(path = route.path(), "Navigate");
                return route == Route::Login;
            }
        }
        false
    }

    /// Validate the stored session, failing if nobody is signed in.
    pub async fn require_user(&mut self) -> Result<User> {
        let state = self.session.check_auth().await;
        self.flush_events();
        match state {
            SessionState::Authenticated(user) => Ok(user),
            _ => bail!("Not signed in. Run `partnerdesk login` first."),
        }
    }

    fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.clear() {
                warn!(error = %e, "Failed to clear dashboard cache");
            }
        }
    }

    async fn load_dashboard(&self) -> Dashboard {
        let dashboard = Dashboard::load(self.session.backend().as_ref()).await;
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.save_dashboard(&dashboard) {
                warn!(error = %e, "Failed to cache dashboard");
            }
        }
        dashboard
    }
}

fn prompt(label: &str) -> Result<String> {
    print!("{}: ", label);
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn prompt_password(label: &str) -> Result<String> {
    Ok(rpassword::prompt_password(format!("{}: ", label))?)
}

// ============================================================================
// Account commands
// ============================================================================

pub async fn login(app: &mut App, email: Option<String>) -> Result<()> {
    let email = match email.or_else(|| app.config.last_email.clone()) {
        Some(email) => {
            println!("Email: {}", email);
            email
        }
        None => prompt("Email")?,
    };
    let password = prompt_password("Password")?;

    let result = app.session.login(LoginRequest::new(email.clone(), password)).await;
    app.flush_events();
    let user = result?;

    app.config.last_email = Some(email);
    if let Err(e) = app.config.save() {
        warn!(error = %e, "Failed to save config");
    }
    println!("Signed in as {} <{}>", user.full_name(), user.email);
    Ok(())
}

pub async fn logout(app: &mut App) -> Result<()> {
    app.session.logout().await;
    app.clear_cache();
    app.flush_events();
    println!("Signed out");
    Ok(())
}

pub async fn status(app: &mut App) -> Result<()> {
    match app.session.check_auth().await {
        SessionState::Authenticated(user) => {
            println!("Signed in as {} <{}>", user.full_name(), user.email);
            if !user.is_verified {
                println!("Email not verified");
            }
            match app.session.credentials().cookies().expires_at(ACCESS_TOKEN_KEY) {
                Ok(Some(expires)) => println!("Session cookie expires {}", expires.format("%b %d, %Y %H:%M UTC")),
                Ok(None) => println!("Session cookie expired; using stored token"),
                Err(e) => warn!(error = %e, "Failed to read session cookie"),
            }
        }
        _ => println!("Not signed in"),
    }
    if let Some(cache) = &app.cache {
        println!("Dashboard cached {}", cache.dashboard_age());
    }
    app.flush_events();
    Ok(())
}

pub async fn register(app: &mut App, first_name: String, last_name: String, email: String) -> Result<()> {
    let form = RegistrationForm {
        first_name,
        last_name,
        email: email.clone(),
        password: prompt_password("Password")?,
        confirm_password: prompt_password("Confirm password")?,
    };
    account::register_installer(app.session.backend().as_ref(), &form).await?;
    println!("{}", account::REGISTERED);
    println!("Run `partnerdesk verify --email {} --code <code>` with the code from your inbox.", email);
    Ok(())
}

pub async fn verify(app: &mut App, email: &str, code: &str) -> Result<()> {
    account::verify_email(app.session.backend().as_ref(), email, code).await?;
    println!("{}", account::EMAIL_VERIFIED);
    Ok(())
}

pub async fn resend_otp(app: &mut App, email: &str) -> Result<()> {
    account::resend_otp(app.session.backend().as_ref(), email).await?;
    println!("{}", account::OTP_RESENT);
    Ok(())
}

pub async fn forgot_password(app: &mut App, email: &str) -> Result<()> {
    account::request_password_reset(app.session.backend().as_ref(), email).await?;
    println!("{}", account::RESET_CODE_SENT);
    Ok(())
}

pub async fn reset_password(app: &mut App, email: String, code: String) -> Result<()> {
    let form = PasswordResetForm {
        email,
        code,
        new_password: prompt_password("New password")?,
        confirm_password: prompt_password("Confirm password")?,
    };
    account::reset_password(app.session.backend().as_ref(), &form).await?;
    println!("{}", account::PASSWORD_RESET);
    Ok(())
}

pub async fn pricing(app: &mut App) -> Result<()> {
    let pricing = app
        .session
        .backend()
        .fetch_pricing()
        .await
        .map_err(PortalError::api("Failed to load pricing"))?;

    println!("Plans");
    for plan in &pricing.plans {
        println!(
            "  {:<12} {:<20} {:>14}  {} days",
            plan.plan_type,
            plan.name,
            format_currency(plan.price),
            plan.duration_days
        );
    }
    println!("Modules");
    for module in &pricing.modules {
        println!(
            "  {:<12} {:<20} {:>14}  {}",
            module.module_type,
            module.short_name(),
            format_currency(module.price),
            truncate_string(&module.description, LIST_WIDTH)
        );
    }
    if !pricing.bundles.is_empty() {
        println!("Bundles");
        for bundle in &pricing.bundles {
            println!(
                "  {:<12} {:<20} {:>14}  {}",
                bundle.code,
                bundle.name,
                format_currency(bundle.price),
                bundle.modules.join(", ")
            );
        }
    }
    Ok(())
}

// ============================================================================
// Signed-in commands
// ============================================================================

pub async fn run_portal(app: &mut App, command: PortalCommand) -> Result<()> {
    match command {
        PortalCommand::Dashboard { offline: true } => show_cached_dashboard(app),
        PortalCommand::Dashboard { offline: false } => {
            let user = app.session.current_user().await;
            let dashboard = app.load_dashboard().await;
            print_dashboard(user.as_ref(), &dashboard);
            Ok(())
        }
        PortalCommand::Codes { action: None } => {
            let dashboard = app.load_dashboard().await;
            if dashboard.codes.is_empty() {
                println!("No referral codes yet. Run `codes generate`.");
            }
            for code in &dashboard.codes {
                println!(
                    "{:<16} {}",
                    code.code,
                    format_optional_date(code.created_at.as_deref(), "")
                );
            }
            Ok(())
        }
        PortalCommand::Codes {
            action: Some(CodesAction::Generate { code }),
        } => {
            dashboard::generate_code(app.session.backend().as_ref(), code.as_deref()).await?;
            println!("{}", dashboard::CODE_GENERATED);
            let dashboard = app.load_dashboard().await;
            if let Ok(link) = dashboard.referral_link() {
                println!("{}", link);
            }
            Ok(())
        }
        PortalCommand::Link => {
            let dashboard = app.load_dashboard().await;
            println!("{}", dashboard.referral_link()?);
            Ok(())
        }
        PortalCommand::Payout => {
            let dashboard = app.load_dashboard().await;
            dashboard.request_payout(app.session.backend().as_ref()).await?;
            println!(
                "{} ({})",
                dashboard::PAYOUT_REQUESTED,
                format_currency(dashboard.pending_balance())
            );
            app.load_dashboard().await;
            Ok(())
        }
        PortalCommand::Profile { action: None } => {
            let user = app.session.refresh_user().await?;
            print_profile(&user);
            Ok(())
        }
        PortalCommand::Profile {
            action:
                Some(ProfileAction::Update {
                    first_name,
                    last_name,
                    phone,
                    bank_name,
                    account_number,
                    account_name,
                }),
        } => {
            let current = app.session.refresh_user().await?;
            let mut update = ProfileUpdate::from(&current);
            let fields = [
                (&mut update.first_name, first_name),
                (&mut update.last_name, last_name),
                (&mut update.phone, phone),
                (&mut update.bank_name, bank_name),
                (&mut update.account_number, account_number),
                (&mut update.account_name, account_name),
            ];
            for (field, value) in fields {
                if let Some(value) = value {
                    *field = value;
                }
            }

            let result = account::update_profile(&app.session, &update).await;
            app.flush_events();
            print_profile(&result?);
            Ok(())
        }
        PortalCommand::Onboard(args) => {
            let dashboard = app.load_dashboard().await;
            let form = onboarding_form(args);
            dashboard.onboard_customer(app.session.backend().as_ref(), &form).await?;
            println!("{}", dashboard::CUSTOMER_ONBOARDED);
            Ok(())
        }
    }
}

fn onboarding_form(args: OnboardArgs) -> OnboardingForm {
    OnboardingForm {
        business_name: args.business_name,
        business_type: args.business_type,
        address: args.address,
        city: args.city,
        currency: args.currency,
        first_name: args.first_name,
        last_name: args.last_name,
        email: args.email,
        password: args.password,
        base_plan_type: args.plan,
        modules: args.modules,
    }
}

fn show_cached_dashboard(app: &App) -> Result<()> {
    let Some(cache) = &app.cache else {
        bail!("Dashboard cache unavailable");
    };
    match cache.load_dashboard()? {
        Some(cached) => {
            let stale = if cached.is_stale() { ", stale" } else { "" };
            println!("Cached {}{}", cached.age_display(), stale);
            print_dashboard(None, &cached.data);
        }
        None => println!("No cached dashboard yet"),
    }
    Ok(())
}

fn print_profile(user: &User) {
    println!("Name:     {}", user.full_name());
    println!("Email:    {}", user.email);
    println!("Phone:    {}", user.phone.as_deref().unwrap_or("-"));
    println!("Bank:     {}", user.bank_name.as_deref().unwrap_or("-"));
    println!("Account:  {}", user.account_number.as_deref().unwrap_or("-"));
    println!("Holder:   {}", user.account_name.as_deref().unwrap_or("-"));
    if !user.has_bank_details() {
        println!("Add bank details to receive payouts.");
    }
}

fn print_dashboard(user: Option<&User>, dashboard: &Dashboard) {
    if let Some(user) = user {
        println!("Welcome back, {}", user.first_name);
    }
    if !dashboard.is_complete() {
        for section in &dashboard.failures {
            eprintln!("Could not load {}", section);
        }
    }

    let summary = dashboard.summary();
    println!();
    println!("Total earnings      {:>16}", format_currency(summary.total_earnings));
    println!("Pending payout      {:>16}", format_currency(summary.pending_balance));
    println!("Referred businesses {:>16}", summary.referred_businesses);
    println!("Total sales         {:>16}", summary.total_sales);
    if !dashboard.can_request_payout() {
        println!(
            "Payouts unlock at {} pending ({} to go)",
            format_currency(dashboard::MIN_PAYOUT_AMOUNT),
            format_currency(dashboard.payout_shortfall())
        );
    }

    println!();
    match dashboard.primary_code() {
        Some(code) => println!("Referral link: {}", code.referral_link()),
        None => println!("No referral code yet"),
    }
    if dashboard.settings.enable_renewal_commission {
        println!("Renewal commissions are enabled");
    }

    if !dashboard.commissions.is_empty() {
        println!();
        println!("Commissions");
        for commission in &dashboard.commissions {
            println!(
                "  {:<14} {:>14}  {:<8} {}",
                format_optional_date(commission.created_at.as_deref(), "-"),
                format_currency(commission.amount),
                commission.status,
                commission
                    .business_id
                    .as_ref()
                    .map(|id| format!("business {}", id))
                    .unwrap_or_default()
            );
        }
    }

    if !dashboard.payouts.is_empty() {
        println!();
        println!("Payout requests");
        for payout in &dashboard.payouts {
            println!(
                "  {:<14} {:>14}  {}",
                format_optional_date(payout.created_at.as_deref(), "-"),
                format_currency(payout.amount),
                payout.status
            );
        }
    }

    if !dashboard.training.is_empty() {
        println!();
        println!("Training");
        for resource in &dashboard.training {
            let kind = if resource.is_video() { "video" } else { "doc" };
            let link = resource
                .embed_url()
                .filter(|_| resource.is_video())
                .unwrap_or_else(|| resource.url.clone());
            println!("  {:<48} {:<5} {}", truncate_string(&resource.title, LIST_WIDTH), kind, link);
        }
    }
}
