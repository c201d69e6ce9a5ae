//! Routes a handful of requests through a small table and prints what each
//! one resolves to.
//!
//! ```sh
//! cargo run --example basic
//! ```

use regex::Regex;
use tollgate::{BoundRequest, Dispatcher, Field, Json, Method, Router, Schema};

async fn echo(req: BoundRequest) -> Json<BoundRequest> {
    Json(req)
}

async fn read_current_user(_req: BoundRequest) -> &'static str {
    "the current user"
}

async fn read_user(req: BoundRequest) -> String {
    format!("user {}", req.text("user_id").unwrap_or_default())
}

async fn read_file(req: BoundRequest) -> String {
    format!("file at {}", req.text("file_path").unwrap_or_default())
}

fn routes() -> Router {
    Router::new()
        .on(
            Method::Get,
            "/items/",
            Schema::new("ListItems")
                .field("skip", Field::int().default(0).ge(0))
                .field("limit", Field::int().default(10).le(100))
                .field("tag", Field::list(Field::text()).optional().max_length(5)),
            echo,
        )
        .on(
            Method::Get,
            "/optional/{item_id}",
            Schema::new("ReadOptional")
                .field("item_id", Field::text())
                .field("q", Field::text().optional().min_length(3).max_length(50))
                .field("short", Field::boolean().default(false)),
            echo,
        )
        .on(
            Method::Get,
            "/users/{user_id}/items/{item_id}",
            Schema::new("ReadUserItem")
                .field("user_id", Field::int())
                .field("item_id", Field::text())
                .field("q", Field::text().optional().pattern(Regex::new("^[a-z]+$").expect("static regex"))),
            echo,
        )
        .on(
            Method::Get,
            "/models/{model_name}",
            Schema::new("Model").field("model_name", Field::one_of(["alexnet", "resnet", "lenet"])),
            echo,
        )
        .on(Method::Get, "/read/{file_path:path}", Schema::default(), read_file)
        .on(Method::Get, "/user/me", Schema::default(), read_current_user)
        .on(Method::Get, "/user/{user_id}", Schema::default(), read_user)
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let app = Dispatcher::new(routes());

    for (method, target) in [
        ("GET", "/items/?skip=20&tag=a&tag=b"),
        ("GET", "/items/?skip=-1&limit=500"),
        ("GET", "/optional/foo?q=somequery&short=yes"),
        ("GET", "/optional/foo?q=ab&short=maybe"),
        ("GET", "/users/3/items/abc?q=fine"),
        ("GET", "/users/x/items/abc?q=NOPE"),
        ("GET", "/models/resnet"),
        ("GET", "/models/vgg"),
        ("GET", "/read/home/johndoe/myfile.txt"),
        ("GET", "/user/me"),
        ("GET", "/user/42"),
        ("HEAD", "/models/lenet"),
        ("POST", "/models/lenet"),
        ("GET", "/nowhere"),
    ] {
        let res = app.dispatch_target(method, target).await;
        println!("{method} {target} -> {}", res.status_code());
        if let Some(allow) = res.header("allow") {
            println!("  allow: {allow}");
        }
        if !res.body().is_empty() {
            println!("  {}", String::from_utf8_lossy(res.body()));
        }
    }
}
