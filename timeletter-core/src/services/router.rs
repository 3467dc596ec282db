//! Routes and the app shell
//!
//! Four pages, one shared session. `App::open` turns a path into a ready
//! page: confirm without a payload falls back to landing, and history loads
//! the session identity's letters on the way in.

use std::sync::Arc;

use serde::Serialize;

use crate::config::Config;
use crate::domain::result::{Error, Result};
use crate::ports::LetterGateway;

use super::compose::ComposeWorkflow;
use super::confirm::{self, ConfirmOutcome, ConfirmView};
use super::history::HistoryWorkflow;
use super::logging::{events, LogEvent};
use super::session::Session;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum Route {
    Landing,
    Compose,
    /// Carries the handoff token when compose produced one
    Confirm(Option<String>),
    History,
}

impl Route {
    pub fn parse(path: &str) -> Result<Self> {
        let path = path.trim();
        let (location, query) = match path.split_once('?') {
            Some((location, query)) => (location, Some(query)),
            None => (path, None),
        };
        let location = location.trim_end_matches('/');

        match location {
            "" => Ok(Route::Landing),
            "/compose" => Ok(Route::Compose),
            "/history" => Ok(Route::History),
            "/confirm" => {
                let token = query.and_then(|q| {
                    url::form_urlencoded::parse(q.as_bytes())
                        .find(|(key, _)| key == "token")
                        .map(|(_, value)| value.into_owned())
                        .filter(|value| !value.trim().is_empty())
                });
                Ok(Route::Confirm(token))
            }
            _ => Err(Error::not_found(format!("No page at {}", path))),
        }
    }

    /// Path without query string
    pub fn page(&self) -> &'static str {
        match self {
            Route::Landing => "/",
            Route::Compose => "/compose",
            Route::Confirm(_) => "/confirm",
            Route::History => "/history",
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::Confirm(Some(token)) => {
                let query: String = url::form_urlencoded::Serializer::new(String::new())
                    .append_pair("token", token)
                    .finish();
                format!("/confirm?{}", query)
            }
            other => other.page().to_string(),
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.path())
    }
}

/// A page ready to render
#[derive(Debug)]
pub enum Page {
    Landing,
    Compose(ComposeWorkflow),
    Confirm(ConfirmView),
    History(HistoryWorkflow),
}

impl Page {
    pub fn route(&self) -> &'static str {
        match self {
            Page::Landing => Route::Landing.page(),
            Page::Compose(_) => Route::Compose.page(),
            Page::Confirm(_) => "/confirm",
            Page::History(_) => Route::History.page(),
        }
    }
}

pub struct App {
    config: Config,
    gateway: Arc<dyn LetterGateway>,
    session: Session,
    current: Route,
}

impl App {
    pub fn new(config: Config, gateway: Arc<dyn LetterGateway>, session: Session) -> Self {
        Self {
            config,
            gateway,
            session,
            current: Route::Landing,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn gateway(&self) -> Arc<dyn LetterGateway> {
        Arc::clone(&self.gateway)
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn current(&self) -> &Route {
        &self.current
    }

    pub async fn open(&mut self, path: &str) -> Result<Page> {
        let route = Route::parse(path)?;
        Ok(self.navigate(route).await)
    }

    pub async fn navigate(&mut self, route: Route) -> Page {
        let page = match route {
            Route::Landing => Page::Landing,
            Route::Compose => Page::Compose(ComposeWorkflow::for_session(self.gateway(), &self.session)),
            Route::Confirm(token) => match confirm::open(token.as_deref(), &mut self.session.handoff) {
                ConfirmOutcome::Show(view) => Page::Confirm(view),
                ConfirmOutcome::Redirect(_) => {
                    self.session
                        .record(LogEvent::new(events::CONFIRM_REDIRECTED).with_page("/confirm"));
                    Page::Landing
                }
            },
            Route::History => {
                let mut history = HistoryWorkflow::new(self.gateway());
                history.mount(&mut self.session).await;
                Page::History(history)
            }
        };

        self.current = match &page {
            Page::Landing => Route::Landing,
            Page::Compose(_) => Route::Compose,
            Page::Confirm(_) => Route::Confirm(None),
            Page::History(_) => Route::History,
        };
        self.session.record(LogEvent::new(events::PAGE_OPENED).with_page(page.route()));
        tracing::debug!(page = page.route(), "page opened");

        page
    }
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("config", &self.config)
            .field("current", &self.current)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_paths() {
        assert_eq!(Route::parse("/").unwrap(), Route::Landing);
        assert_eq!(Route::parse("").unwrap(), Route::Landing);
        assert_eq!(Route::parse("/compose/").unwrap(), Route::Compose);
        assert_eq!(Route::parse("/history").unwrap(), Route::History);
        assert_eq!(Route::parse("/confirm").unwrap(), Route::Confirm(None));
        assert_eq!(
            Route::parse("/confirm?token=abc-123").unwrap(),
            Route::Confirm(Some("abc-123".to_string()))
        );
        assert_eq!(Route::parse("/confirm?token=").unwrap(), Route::Confirm(None));
    }

    #[test]
    fn test_unknown_path_is_not_found() {
        let err = Route::parse("/settings").unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert!(Route::parse("/compose/extra").is_err());
    }

    #[test]
    fn test_path_is_inverse_of_parse() {
        for route in [
            Route::Landing,
            Route::Compose,
            Route::History,
            Route::Confirm(None),
            Route::Confirm(Some("a b&c".to_string())),
        ] {
            assert_eq!(Route::parse(&route.path()).unwrap(), route);
        }
    }
}
