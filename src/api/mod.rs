pub mod shop;

use annoroute::RouteRegistry;

pub fn register(registry: &mut RouteRegistry) {
    shop::register(registry);
}
