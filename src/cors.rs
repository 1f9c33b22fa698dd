use log::debug;
use rocket::{
    fairing::{Fairing, Info, Kind},
    http::{Header, Status},
    Request, Response, Route,
};

use crate::config::Config;

const ALLOW_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";
const ALLOW_HEADERS: &str = "Origin, X-Requested-With, Content-Type, Accept, Authorization";
const MAX_AGE_SECS: &str = "600";

pub fn routes() -> Vec<Route> {
    routes![preflight]
}

/// Answer every pre-flight request; the fairing supplies the headers.
#[options("/<_..>")]
pub fn preflight() -> Status {
    Status::Ok
}

/// A rocket fairing that attaches CORS headers to every response.
///
/// The request's `Origin` is echoed back when present, so credentialed
/// browser requests work from any front-end. Otherwise the configured
/// fallback origin is used.
#[derive(Debug, Copy, Clone)]
pub struct CorsFairing;

#[rocket::async_trait]
impl Fairing for CorsFairing {
    fn info(&self) -> Info {
        Info {
            name: "CORS",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, req: &'r Request<'_>, res: &mut Response<'r>) {
        match req.headers().get_one("Origin") {
            Some(origin) => {
                res.set_header(Header::new("Access-Control-Allow-Origin", origin.to_string()));
                res.set_header(Header::new("Vary", "Origin"));
            }
            None => {
                let fallback = req
                    .rocket()
                    .state::<Config>()
                    .map_or("*", |config| config.cors_origin())
                    .to_string();
                res.set_header(Header::new("Access-Control-Allow-Origin", fallback));
            }
        }
        res.set_header(Header::new("Access-Control-Allow-Methods", ALLOW_METHODS));
        res.set_header(Header::new("Access-Control-Allow-Headers", ALLOW_HEADERS));
        res.set_header(Header::new("Access-Control-Max-Age", MAX_AGE_SECS));
        debug!("Attached CORS headers to {} {}", req.method(), req.uri());
    }
}
