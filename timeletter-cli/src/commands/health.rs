//! Health command - check that the letter service answers

use anyhow::Result;
use timeletter_core::ports::LetterGateway;

use super::{get_context, with_spinner, Reported};
use crate::output;

pub async fn run(json: bool) -> Result<()> {
    let ctx = get_context()?;
    let base_url = ctx.gateway.base_url().to_string();
    let result = with_spinner("Contacting letter service...", ctx.gateway.health_check()).await;

    if json {
        let body = match &result {
            Ok(health) => serde_json::json!({"ok": true, "baseUrl": base_url, "status": health.status}),
            Err(e) => serde_json::json!({"ok": false, "baseUrl": base_url, "error": e.to_string()}),
        };
        println!("{}", serde_json::to_string_pretty(&body)?);
        return if result.is_ok() { Ok(()) } else { Err(Reported.into()) };
    }

    match result {
        Ok(health) => {
            output::success(&format!("{} is {}", base_url, health.status));
            Ok(())
        }
        Err(e) => {
            output::error(&format!("{} is unreachable: {}", base_url, e));
            Err(Reported.into())
        }
    }
}
