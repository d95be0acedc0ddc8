use axum::response::Html;

pub async fn index() -> Html<&'static str> {
    Html(include_str!("../../static/index.html"))
}

pub async fn chat() -> Html<&'static str> {
    Html(include_str!("../../static/chat.html"))
}

pub async fn about() -> Html<&'static str> {
    Html(include_str!("../../static/about.html"))
}

pub async fn pricing() -> Html<&'static str> {
    Html(include_str!("../../static/pricing.html"))
}

pub async fn contact() -> Html<&'static str> {
    Html(include_str!("../../static/contact.html"))
}
