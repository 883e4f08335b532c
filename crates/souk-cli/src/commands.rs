//! Subcommand implementations.

use anyhow::Context;
use clap::Args;
use serde_json::json;

use souk_client_core::ClientCore;
use souk_client_core::connectivity::ProbeTransport;
use souk_client_core::session::ProfileFetcher;
use souk_client_core::storage::keys;

/// Arguments for the login command.
#[derive(Args)]
pub struct LoginArgs {
    /// Access token issued by the auth flow
    #[arg(long)]
    pub token: String,
    /// Refresh token, when one was issued
    #[arg(long)]
    pub refresh_token: Option<String>,
}

/// Arguments for the status command.
#[derive(Args)]
pub struct StatusArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the prefs command.
#[derive(Args)]
pub struct PrefsArgs {
    /// Set the app language
    #[arg(long)]
    pub lang: Option<String>,
    /// Set the app theme
    #[arg(long)]
    pub theme: Option<String>,
}

fn core() -> anyhow::Result<ClientCore> {
    ClientCore::bootstrap().context("failed to assemble client core")
}

pub async fn login(args: LoginArgs) -> anyhow::Result<()> {
    let core = core()?;

    // The token is the credential; fetch the profile it belongs to before
    // committing the session, like the auth screen does after OTP verify.
    let profile = match core.api.fetch_profile(&args.token).await {
        Ok(profile) => profile,
        Err(err) => {
            println!("Login failed: {}", err.user_message());
            return Ok(());
        }
    };

    core.session
        .login(profile, args.token, args.refresh_token)
        .await;

    let state = core.session.snapshot();
    match &state.error {
        None => println!(
            "Signed in as {}",
            state
                .user
                .as_ref()
                .map(|u| u.display_label().to_string())
                .unwrap_or_default()
        ),
        Some(error) => println!("Login failed: {error}"),
    }
    Ok(())
}

pub async fn logout() -> anyhow::Result<()> {
    let core = core()?;
    core.session.logout().await;
    println!("Signed out.");
    Ok(())
}

pub async fn whoami() -> anyhow::Result<()> {
    let core = core()?;
    core.session.initialize_auth().await;

    let state = core.session.snapshot();
    if !state.is_authenticated {
        println!("Not signed in.");
        return Ok(());
    }
    match &state.user {
        Some(user) => println!("Signed in as {}", user.display_label()),
        None => println!(
            "Signed in (profile unavailable{})",
            state
                .error
                .as_deref()
                .map(|e| format!(": {e}"))
                .unwrap_or_default()
        ),
    }
    Ok(())
}

pub async fn status(args: StatusArgs) -> anyhow::Result<()> {
    let core = core()?;
    let connectivity = core.monitor.check().await;
    let has_credentials = core.store.get(keys::AUTH_TOKEN).await.is_some();
    let prefs = core.preferences();
    let lang = prefs.language().await;
    let theme = prefs.theme().await;

    if args.json {
        let payload = json!({
            "base_url": core.config.base_url,
            "storage_backend": core.store.backend_kind().as_str(),
            "connectivity": connectivity,
            "credentials_present": has_credentials,
            "app_lang": lang,
            "app_theme": theme,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    println!("Souk Client Status");
    println!("==================\n");
    println!("Backend: {}", core.config.base_url);
    println!("Storage: {}", core.store.backend_kind().as_str());
    match connectivity.user_message() {
        None => println!("Connectivity: ok"),
        Some(message) => println!("Connectivity: {message}"),
    }
    println!(
        "Credentials: {}",
        if has_credentials { "present" } else { "none" }
    );
    println!("Language: {}", lang.as_deref().unwrap_or("(default)"));
    println!("Theme: {}", theme.as_deref().unwrap_or("(default)"));
    Ok(())
}

pub async fn doctor() -> anyhow::Result<()> {
    let core = core()?;

    println!("Probing {} ...\n", core.config.base_url);

    let liveness = core.api.liveness().await;
    match &liveness {
        Ok(()) => println!("health probe:     ok"),
        Err(err) => println!("health probe:     failed ({err})"),
    }

    let write = core.api.write_path().await;
    match &write {
        Ok(status) => println!("write-path probe: status {status}"),
        Err(err) => println!("write-path probe: failed ({err})"),
    }

    let status = core.monitor.check().await;
    println!("\nOverall: {:?}", status);
    if let Some(message) = status.user_message() {
        println!("{message}");
    }
    Ok(())
}

pub async fn prefs(args: PrefsArgs) -> anyhow::Result<()> {
    let core = core()?;
    let prefs = core.preferences();

    if let Some(lang) = &args.lang {
        prefs.set_language(lang).await;
    }
    if let Some(theme) = &args.theme {
        prefs.set_theme(theme).await;
    }

    println!(
        "Language: {}",
        prefs.language().await.as_deref().unwrap_or("(default)")
    );
    println!(
        "Theme: {}",
        prefs.theme().await.as_deref().unwrap_or("(default)")
    );
    Ok(())
}
