use bitematch_core::account::GUEST_MESSAGE;

use crate::auth::clear_stored_session;
use crate::cli::AuthCommands;
use crate::commands::common::{
    confirm, format_timestamp, save_discovery_cache, CliContext, DiscoveryCache,
};
use crate::error::CliError;

pub async fn run_auth(ctx: &CliContext, command: AuthCommands) -> Result<(), CliError> {
    let profile_name = &ctx.profile_name;
    let Some(account) = ctx.account()? else {
        // Signing out needs no Firebase config, only the stored session
        if matches!(command, AuthCommands::Logout) {
            clear_stored_session(profile_name).map_err(|error| CliError::Auth(error.to_string()))?;
            println!("Signed out profile '{profile_name}'");
            return Ok(());
        }
        return Err(CliError::FirebaseNotConfigured);
    };

    match command {
        AuthCommands::Signup { email, password } => {
            let outcome = account.sign_up(&email, &password).await?;
            let email_label = outcome.session().user.email.as_deref().unwrap_or(&email);
            println!("{} Signed in profile '{profile_name}' as {email_label}", outcome.message());
            Ok(())
        }
        AuthCommands::Login { email, password } => {
            let session = account.sign_in(&email, &password).await?;
            let email_label = session.user.email.as_deref().unwrap_or("(no email)");
            println!("Signed in profile '{profile_name}' as {email_label}");
            Ok(())
        }
        AuthCommands::Logout => {
            let guest = account.sign_out().await?;
            save_discovery_cache(&ctx.db, &DiscoveryCache::default()).await?;
            println!("Signed out profile '{profile_name}'");
            if guest.is_some() {
                println!("{GUEST_MESSAGE}");
            }
            Ok(())
        }
        AuthCommands::Status => {
            let session = account
                .auth()
                .restore_session()
                .await
                .map_err(|error| CliError::Auth(error.to_string()))?;

            let Some(session) = session else {
                println!("Profile '{profile_name}' is not signed in.");
                return Ok(());
            };
            let user = &session.user;
            let kind = if user.is_anonymous { "guest" } else { "account" };
            println!(
                "Profile '{profile_name}' is signed in as {} ({kind}, expires {})",
                user.display_label(),
                format_timestamp(session.expires_at.saturating_mul(1000))
            );
            if let Some(email) = user.email.as_deref() {
                println!("Email: {email}");
            }
            Ok(())
        }
        AuthCommands::ResetPassword { email } => {
            account.send_password_reset(&email).await?;
            println!("Password reset email sent to {}", email.trim());
            Ok(())
        }
        AuthCommands::DeleteAccount { yes } => {
            if !yes
                && !confirm("Delete this account, its matches and swipe history permanently?")?
            {
                return Err(CliError::Aborted);
            }
            account.delete_account().await?;
            save_discovery_cache(&ctx.db, &DiscoveryCache::default()).await?;
            println!("Account deleted for profile '{profile_name}'");
            Ok(())
        }
    }
}
