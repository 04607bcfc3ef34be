pub use self::param_value::ParamValue;
pub use self::route_params::RouteParams;

mod param_value;
mod route_params;
