mod order;

use annoroute::RouteRegistry;

pub fn register(registry: &mut RouteRegistry) {
    order::register(registry);
}
