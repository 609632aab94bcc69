mod favorites;
mod listings;
mod messages;
mod users;

/// `?1, ?2, ...` for an `IN (...)` list of `count` parameters.
fn placeholders(count: usize) -> String {
    (1..=count)
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(", ")
}
