//! Identity commands - whoami / logout

use anyhow::Result;
use timeletter_core::state::UserAction;

use super::get_context;
use crate::output;

pub fn whoami(json: bool) -> Result<()> {
    let session = get_context()?.session(None)?;
    let state = session.user.state();

    if json {
        println!("{}", serde_json::to_string_pretty(state)?);
        return Ok(());
    }

    match &state.email {
        Some(email) => println!("{}", email),
        None => output::info("No email remembered yet. It is saved when you compose a letter or look up history."),
    }
    Ok(())
}

pub fn logout() -> Result<()> {
    let mut session = get_context()?.session(None)?;
    let had_email = session.user.state().is_authenticated;
    session.user.dispatch(UserAction::Logout)?;

    if had_email {
        output::success("Forgot the remembered email");
    } else {
        output::info("No email was remembered");
    }
    Ok(())
}
