mod server;

#[cfg(test)]
mod test_support;

#[cfg(test)]
mod analysis_test;
#[cfg(test)]
mod documents_test;
#[cfg(test)]
mod inlay_hint_test;
#[cfg(test)]
mod scheduler_test;

#[tokio::main]
async fn main() {
    server::run().await;
}
