use bitematch_core::models::UserProfile;

use crate::cli::ProfileCommands;
use crate::commands::common::CliContext;
use crate::error::CliError;

pub async fn run_profile(ctx: &CliContext, command: ProfileCommands) -> Result<(), CliError> {
    let account = ctx.require_account()?;

    match command {
        ProfileCommands::Show => {
            let Some(user) = account.current_user()? else {
                println!("Not signed in. Run `bitematch auth login` or `bitematch auth signup`.");
                return Ok(());
            };
            println!("Name:   {}", user.display_label());
            println!("Email:  {}", user.email.as_deref().unwrap_or("-"));
            println!("Photo:  {}", user.photo_url.as_deref().unwrap_or("-"));
            if user.is_anonymous {
                println!("Guest accounts can be secured with `bitematch auth signup`.");
            }
            Ok(())
        }
        ProfileCommands::Edit { name, photo_url } => {
            if name.is_none() && photo_url.is_none() {
                return Err(CliError::Core(bitematch_core::Error::InvalidInput(
                    "Nothing to update. Pass --name or --photo-url.".to_string(),
                )));
            }
            let session = account
                .update_profile(UserProfile {
                    display_name: name,
                    photo_url,
                })
                .await?;
            println!("Profile updated: {}", session.user.display_label());
            Ok(())
        }
    }
}
