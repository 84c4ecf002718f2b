use annoroute::dispatch::{boxed, hook, BoxFuture, Dispatch, Hook, Outcome};
use annoroute::{Controller, RouteRegistry};
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Deserialize)]
struct NewUser {
    name: String,
    #[serde(default)]
    email: Option<String>,
}

fn require_token(dispatch: &mut Dispatch) -> BoxFuture<'_, Outcome> {
    boxed(async move {
        if dispatch.header("x-token").is_none() && dispatch.arg("token").is_none() {
            return dispatch.fail(("token required", Value::Null, 401));
        }
        Ok(())
    })
}

pub struct User;

#[annoroute::controller]
impl User {
    /// @Get("profile/{id}")
    pub async fn show(&self, dispatch: &mut Dispatch) -> Outcome {
        let id = dispatch.param("id").unwrap_or_default().to_string();
        dispatch.success(("ok", json!({ "id": id })))
    }

    /// @Post
    pub async fn create(&self, dispatch: &mut Dispatch) -> Outcome {
        match dispatch.json::<NewUser>() {
            Ok(user) => dispatch.success(("created", json!({ "name": user.name, "email": user.email }))),
            Err(err) => dispatch.fail(("invalid body", json!({ "error": err.to_string() }), 422)),
        }
    }

    /// @Request(value="page", method="GET")
    pub async fn page(&self, dispatch: &mut Dispatch) -> Outcome {
        let name = dispatch.arg("name").unwrap_or_else(|| "guest".to_string());
        dispatch.assign("name", json!(name));
        dispatch.fetch(())
    }
}

impl Controller for User {
    fn before_action(&self) -> Vec<Hook> {
        vec![hook(require_token)]
    }
}

pub fn register(registry: &mut RouteRegistry) {
    annoroute::register!(registry, User);
}
