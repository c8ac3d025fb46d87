//! Command line arguments.

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "partnerdesk",
    version,
    about = "Betaday partner portal in the terminal"
)]
pub struct Args {
    /// API base URL, e.g. https://api.betadaypos.com/api/v1
    #[arg(long, global = true, env = "PARTNERDESK_API_URL")]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Sign in and store the session
    Login {
        #[arg(short, long)]
        email: Option<String>,
    },
    /// Sign out and clear stored tokens and cached data
    Logout,
    /// Show who is signed in
    Status,
    /// Create a partner account
    Register {
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        email: String,
    },
    /// Confirm the code sent to your email
    Verify {
        #[arg(long)]
        email: String,
        #[arg(long)]
        code: String,
    },
    /// Send a new verification code
    ResendOtp {
        #[arg(long)]
        email: String,
    },
    /// Email a password reset code
    ForgotPassword {
        #[arg(long)]
        email: String,
    },
    /// Set a new password with a reset code
    ResetPassword {
        #[arg(long)]
        email: String,
        #[arg(long)]
        code: String,
    },
    /// Public subscription and module pricing
    Pricing,
    /// Interactive session with the inactivity timeout enforced
    Shell,
    #[command(flatten)]
    Portal(PortalCommand),
}

/// Commands that need a signed-in partner. Also the grammar of `shell`.
#[derive(Subcommand, Debug, Clone)]
pub enum PortalCommand {
    /// Earnings, codes, payouts and training at a glance
    Dashboard {
        /// Show the last cached dashboard without contacting the server
        #[arg(long)]
        offline: bool,
    },
    /// Referral codes
    Codes {
        #[command(subcommand)]
        action: Option<CodesAction>,
    },
    /// Print the referral link for your primary code
    Link,
    /// Request a payout of the pending balance
    Payout,
    /// Show or edit profile and bank details
    Profile {
        #[command(subcommand)]
        action: Option<ProfileAction>,
    },
    /// Onboard a customer business under your referral code
    Onboard(OnboardArgs),
}

#[derive(Subcommand, Debug, Clone)]
pub enum CodesAction {
    /// Generate a new code; the server picks one if none is given
    Generate { code: Option<String> },
}

#[derive(Subcommand, Debug, Clone)]
pub enum ProfileAction {
    /// Change any of the given fields, keeping the rest
    Update {
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        bank_name: Option<String>,
        #[arg(long)]
        account_number: Option<String>,
        #[arg(long)]
        account_name: Option<String>,
    },
}

#[derive(clap::Args, Debug, Clone)]
pub struct OnboardArgs {
    #[arg(long)]
    pub business_name: String,
    #[arg(long, default_value = "RETAIL")]
    pub business_type: String,
    #[arg(long, default_value = "")]
    pub address: String,
    #[arg(long, default_value = "Lagos")]
    pub city: String,
    #[arg(long, default_value = "NGN")]
    pub currency: String,
    #[arg(long)]
    pub first_name: String,
    #[arg(long, default_value = "")]
    pub last_name: String,
    #[arg(long)]
    pub email: String,
    /// Initial password for the owner account
    #[arg(long, default_value = "password123")]
    pub password: String,
    #[arg(long, default_value = "TRIAL")]
    pub plan: String,
    /// Module to enable; repeat for several
    #[arg(long = "module")]
    pub modules: Vec<String>,
}

/// One line typed at the `shell` prompt.
#[derive(Parser, Debug)]
#[command(no_binary_name = true, disable_version_flag = true)]
pub enum ShellLine {
    #[command(flatten)]
    Portal(PortalCommand),
    /// Sign out and leave the shell
    Logout,
    /// Minutes left before the session times out
    Idle,
    /// Leave the shell, staying signed in
    #[command(alias = "quit")]
    Exit,
}
