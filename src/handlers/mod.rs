pub async fn index() -> &'static str {
    "Service is running"
}
