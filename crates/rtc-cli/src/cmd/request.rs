//! `rtc request`: raw authenticated request, for poking at service URLs.

use crate::context::Context;
use clap::{Args, ValueEnum};
use rtc_core::transport::Method;
use std::io::Write;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum RequestMethod {
    #[value(name = "GET", alias = "get")]
    Get,
    #[value(name = "POST", alias = "post")]
    Post,
}

impl From<RequestMethod> for Method {
    fn from(method: RequestMethod) -> Self {
        match method {
            RequestMethod::Get => Self::Get,
            RequestMethod::Post => Self::Post,
        }
    }
}

#[derive(Args, Debug)]
pub struct RequestArgs {
    /// Absolute URL, or a path under the service root.
    pub url: String,

    /// Request method.
    #[arg(long, value_enum, default_value = "GET")]
    pub method: RequestMethod,
}

/// Execute `rtc request <url>`; the body goes to stdout unchanged.
///
/// # Errors
///
/// Login, transport and status failures.
pub fn run_request(args: &RequestArgs, ctx: &Context) -> anyhow::Result<()> {
    let mut client = ctx.connect()?;
    let body = client.raw_request(args.method.into(), &args.url)?;

    let mut out = std::io::stdout().lock();
    out.write_all(&body)?;
    writeln!(out)?;
    Ok(())
}
