use crate::RouteError;
use hyper::body::Bytes;
use serde::Serialize;

/// What a callback hands back when it returns.
///
/// With [`RouterConfig::treat_return_as_response`](crate::RouterConfig) enabled, a reply
/// is sent on the callback's behalf unless the callback already sent something itself.
/// Otherwise replies are ignored.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Empty,
    Text(String),
    Bytes(Bytes),
    Json(serde_json::Value),
    /// A value the router can't send. Raises `RoutingError::InvalidReturnType` when sent.
    Unsupported(String),
}

impl Reply {
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Reply {
        match serde_json::to_value(value) {
            Ok(value) => Reply::Json(value),
            Err(err) => Reply::Unsupported(err.to_string()),
        }
    }
}

/// Conversion of a callback's output into a [`Reply`].
pub trait IntoReply {
    fn into_reply(self) -> Result<Reply, RouteError>;
}

impl IntoReply for () {
    fn into_reply(self) -> Result<Reply, RouteError> {
        Ok(Reply::Empty)
    }
}

impl IntoReply for Reply {
    fn into_reply(self) -> Result<Reply, RouteError> {
        Ok(self)
    }
}

impl IntoReply for String {
    fn into_reply(self) -> Result<Reply, RouteError> {
        Ok(Reply::Text(self))
    }
}

impl IntoReply for &'static str {
    fn into_reply(self) -> Result<Reply, RouteError> {
        Ok(Reply::Text(self.to_owned()))
    }
}

impl IntoReply for Bytes {
    fn into_reply(self) -> Result<Reply, RouteError> {
        Ok(Reply::Bytes(self))
    }
}

impl IntoReply for Vec<u8> {
    fn into_reply(self) -> Result<Reply, RouteError> {
        Ok(Reply::Bytes(Bytes::from(self)))
    }
}

impl IntoReply for serde_json::Value {
    fn into_reply(self) -> Result<Reply, RouteError> {
        Ok(Reply::Json(self))
    }
}

impl<T, E> IntoReply for Result<T, E>
where
    T: IntoReply,
    E: Into<RouteError>,
{
    fn into_reply(self) -> Result<Reply, RouteError> {
        self.map_err(Into::into).and_then(IntoReply::into_reply)
    }
}
