//! Request-scoped route identity.

use serde::Serialize;

use crate::naming::camel_to_snake;

/// Version, module, controller and action of the route serving a request.
///
/// Parsed from the handler name assigned at registration,
/// `{version}/{module}/{Controller}.{action}`. Every part is snake-cased;
/// the default version is stored as an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RouteIdentity {
    pub version: String,
    pub module: String,
    pub controller: String,
    pub action: String,
    pub handler: String,
}

impl RouteIdentity {
    pub fn from_handler_name(handler: &str, default_version: &str) -> Self {
        let mut segments = handler.splitn(3, '/');
        let version = segments.next().unwrap_or_default();
        let module = segments.next().unwrap_or_default();
        let tail = segments.next().unwrap_or_default();
        let (controller, action) = tail.rsplit_once('.').unwrap_or((tail, ""));

        Self {
            version: if version == default_version {
                String::new()
            } else {
                camel_to_snake(version)
            },
            module: camel_to_snake(module),
            controller: camel_to_snake(controller),
            action: camel_to_snake(action),
            handler: handler.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_version_is_elided() {
        let identity = RouteIdentity::from_handler_name("application/index/UserProfile.show", "application");
        assert_eq!(identity.version, "");
        assert_eq!(identity.module, "index");
        assert_eq!(identity.controller, "user_profile");
        assert_eq!(identity.action, "show");
    }

    #[test]
    fn test_named_version_is_snake_cased() {
        let identity = RouteIdentity::from_handler_name("ApiV2/shop/Order.list_all", "application");
        assert_eq!(identity.version, "api_v2");
        assert_eq!(identity.module, "shop");
        assert_eq!(identity.controller, "order");
        assert_eq!(identity.action, "list_all");
        assert_eq!(identity.handler, "ApiV2/shop/Order.list_all");
    }

    #[test]
    fn test_malformed_names_leave_parts_empty() {
        let identity = RouteIdentity::from_handler_name("api", "application");
        assert_eq!(identity.version, "api");
        assert!(identity.module.is_empty());
        assert!(identity.action.is_empty());
    }
}
