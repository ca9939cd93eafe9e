use tgcollect_core::AppConfig;
use tgcollect_remote::RemoteClient;

/// Register the configured session and report whether it is authorized.
pub(crate) async fn register(config: &AppConfig) -> anyhow::Result<()> {
    let client = RemoteClient::from_app_config(config)?;
    let info = client.create_session().await?;

    if info.authorized {
        match info.user_id {
            Some(user_id) => println!(
                "session '{}' is authorized as user {user_id}",
                info.session_name
            ),
            None => println!("session '{}' is authorized", info.session_name),
        }
    } else {
        println!(
            "session '{}' registered but not yet authorized; complete the login on the gateway",
            info.session_name
        );
    }
    Ok(())
}
