// src/core/webdriver.rs
//! Just enough of the W3C WebDriver protocol to drive geckodriver.
//!
//! The potential-question list is rendered client-side and only fills in while
//! the page is scrolled, so a plain HTTP GET sees an empty shell. This client
//! starts geckodriver, opens one (usually headless) Firefox session and exposes
//! the handful of commands the scraper needs:
//!
//! - `navigate`     POST   /session/{id}/url
//! - `add_cookie`   POST   /session/{id}/cookie
//! - `execute`      POST   /session/{id}/execute/sync
//! - `page_source`  GET    /session/{id}/source
//! - `quit`         DELETE /session/{id}
//!
//! Every response carries a `value`; failures put `{error, message}` inside it.

use std::{
    process::{Child, Command, Stdio},
    thread,
    time::{Duration, Instant},
};

use reqwest::{Method, StatusCode, blocking::Client};
use serde_json::{Value, json};

use crate::{
    config::{consts::DRIVER_READY_TIMEOUT_MS, options::ScraperOptions},
    core::Cookie,
    error::{Error, Result},
};

pub struct Driver {
    http: Client,
    base: String,
    session: Option<String>,
    child: Option<Child>,
}

impl Driver {
    /// Spawn the driver binary and open a browser session on it.
    pub fn launch(opts: &ScraperOptions) -> Result<Self> {
        logf!("Driver: starting {} on port {}", opts.driver_path.display(), opts.driver_port);
        let child = Command::new(&opts.driver_path)
            .arg("--port")
            .arg(opts.driver_port.to_string())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| Error::DriverLaunch(format!("{}: {e}", opts.driver_path.display())))?;

        let mut driver = Self {
            http: Client::builder().timeout(Duration::from_secs(60)).build()?,
            base: opts.driver_base_url(),
            session: None,
            child: Some(child),
        };
        driver.wait_ready(Duration::from_millis(DRIVER_READY_TIMEOUT_MS))?;
        driver.new_session(opts.headless)?;
        Ok(driver)
    }

    fn wait_ready(&mut self, timeout: Duration) -> Result<()> {
        let started = Instant::now();
        let url = format!("{}/status", self.base);
        loop {
            let ready = self.http.get(&url).send()
                .ok()
                .and_then(|r| r.json::<Value>().ok())
                .and_then(|v| v["value"]["ready"].as_bool())
                .unwrap_or(false);
            if ready {
                logd!("Driver: ready after {} ms", started.elapsed().as_millis());
                return Ok(());
            }

            if let Some(child) = self.child.as_mut() {
                if let Ok(Some(status)) = child.try_wait() {
                    return Err(Error::DriverLaunch(format!("driver exited early ({status})")));
                }
            }
            if started.elapsed() > timeout {
                return Err(Error::DriverLaunch(format!(
                    "driver not ready after {} ms at {}", timeout.as_millis(), self.base
                )));
            }
            thread::sleep(Duration::from_millis(200));
        }
    }

    fn new_session(&mut self, headless: bool) -> Result<()> {
        let args: Vec<&str> = if headless { vec!["-headless"] } else { Vec::new() };
        let caps = json!({
            "capabilities": {
                "alwaysMatch": {
                    "browserName": "firefox",
                    "moz:firefoxOptions": { "args": args }
                }
            }
        });
        let value = self.command(Method::POST, "/session", Some(caps))?;
        let id = value["sessionId"].as_str().ok_or_else(|| Error::WebDriver {
            error: s!("session not created"),
            message: format!("no sessionId in {value}"),
        })?;
        logf!("Driver: session {} (headless={})", id, headless);
        self.session = Some(s!(id));
        Ok(())
    }

    pub fn navigate(&self, url: &str) -> Result<()> {
        let path = self.session_path("/url")?;
        self.command(Method::POST, &path, Some(json!({ "url": url })))?;
        Ok(())
    }

    /// Cookies only attach to the domain of the current page, so navigate first.
    pub fn add_cookie(&self, cookie: &Cookie) -> Result<()> {
        let path = self.session_path("/cookie")?;
        let body = json!({ "cookie": { "name": cookie.name, "value": cookie.value } });
        self.command(Method::POST, &path, Some(body))?;
        Ok(())
    }

    pub fn execute(&self, script: &str) -> Result<Value> {
        let path = self.session_path("/execute/sync")?;
        self.command(Method::POST, &path, Some(json!({ "script": script, "args": [] })))
    }

    pub fn page_source(&self) -> Result<String> {
        let path = self.session_path("/source")?;
        match self.command(Method::GET, &path, None)? {
            Value::String(src) => Ok(src),
            other => Err(Error::WebDriver {
                error: s!("unexpected response"),
                message: format!("page source was not a string: {other}"),
            }),
        }
    }

    /// End the session and stop the driver process. Safe to call twice.
    pub fn quit(&mut self) {
        if let Some(id) = self.session.take() {
            let path = format!("/session/{id}");
            match self.command(Method::DELETE, &path, None) {
                Ok(_) => logd!("Driver: session {} closed", id),
                Err(e) => logw!("Driver: closing session {} failed: {}", id, e),
            }
        }
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
            logd!("Driver: process stopped");
        }
    }

    fn session_path(&self, tail: &str) -> Result<String> {
        let id = self.session.as_deref().ok_or_else(|| Error::WebDriver {
            error: s!("invalid session id"),
            message: s!("no active session"),
        })?;
        Ok(format!("/session/{id}{tail}"))
    }

    fn command(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value> {
        let url = format!("{}{}", self.base, path);
        let mut req = self.http.request(method, &url);
        if let Some(b) = body {
            req = req.json(&b);
        }
        let resp = req.send()?;
        let status = resp.status();
        let payload: Value = resp.json()?;
        if !status.is_success() {
            return Err(error_from_payload(status, &payload));
        }
        Ok(payload.get("value").cloned().unwrap_or(Value::Null))
    }
}

impl Drop for Driver {
    fn drop(&mut self) {
        self.quit();
    }
}

fn error_from_payload(status: StatusCode, payload: &Value) -> Error {
    let value = &payload["value"];
    Error::WebDriver {
        error: value["error"].as_str().map(String::from).unwrap_or_else(|| status.to_string()),
        message: value["message"].as_str().map(String::from).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_payload_maps_fields() {
        let payload = json!({
            "value": { "error": "no such window", "message": "Browsing context has been discarded" }
        });
        match error_from_payload(StatusCode::NOT_FOUND, &payload) {
            Error::WebDriver { error, message } => {
                assert_eq!(error, "no such window");
                assert_eq!(message, "Browsing context has been discarded");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn error_payload_falls_back_to_status() {
        match error_from_payload(StatusCode::INTERNAL_SERVER_ERROR, &json!({})) {
            Error::WebDriver { error, message } => {
                assert!(error.contains("500"));
                assert!(message.is_empty());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn launch_reports_missing_binary() {
        let opts = ScraperOptions {
            driver_path: "definitely/not/here/geckodriver".into(),
            ..ScraperOptions::default()
        };
        assert!(matches!(Driver::launch(&opts), Err(Error::DriverLaunch(_))));
    }
}
