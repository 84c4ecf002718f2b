pub mod index;

use annoroute::RouteRegistry;

pub fn register(registry: &mut RouteRegistry) {
    index::register(registry);
}
