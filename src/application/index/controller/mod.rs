mod index;
mod user;

use annoroute::RouteRegistry;

pub fn register(registry: &mut RouteRegistry) {
    index::register(registry);
    user::register(registry);
}
