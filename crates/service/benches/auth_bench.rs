use criterion::{criterion_group, criterion_main, Criterion};
use std::sync::Arc;

use chrono::Duration;
use models::enums::UserRole;
use service::auth::domain::LoginInput;
use service::auth::service::{AuthConfig, AuthService};
use service::auth::token::TokenConfig;
use service::memory::InMemoryBank;

fn bench_login(c: &mut Criterion) {
    let bank = Arc::new(InMemoryBank::new());
    let cfg = AuthConfig {
        token: TokenConfig {
            secret: "bench-secret-bench-secret-bench-secret".into(),
            issuer: "bank-sim-api".into(),
            audience: "bank-sim-clients".into(),
            ttl: Duration::hours(24),
        },
        password_algorithm: "argon2".into(),
    };
    let svc = AuthService::new(bank.clone(), None, cfg);

    // seed the user outside of the benchmark using a tokio runtime
    let rt = tokio::runtime::Runtime::new().unwrap();
    rt.block_on(bank.seed_user("bench@bank.in", "Bench", UserRole::Customer, None, "Benchmark1"));

    c.bench_function("auth_login_verify", |b| {
        b.iter(|| {
            let session = rt
                .block_on(svc.login(LoginInput { email: "bench@bank.in".into(), password: "Benchmark1".into() }))
                .unwrap();
            svc.verify_token(&session.token).unwrap();
        });
    });
}

criterion_group!(benches, bench_login);
criterion_main!(benches);
