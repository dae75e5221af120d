use criterion::{criterion_group, criterion_main, Criterion};
use rand::SeedableRng;
use rand_chacha::ChaChaRng;

use bls12_381_plus::{group::Group, Gt};
use ibtrpre::{
    authority::{Authority, SystemParams},
    cca,
    decrypt::dec1,
    delegate::rk_gen,
    identity::IdentityValue,
    Pkg, TimeServer,
};

fn rng() -> ChaChaRng {
    ChaChaRng::from_seed([0; 32])
}

fn setup(c: &mut Criterion) {
    let mut rng = rng();
    c.bench_function("Authority::setup", |b| {
        b.iter(|| Authority::<Pkg>::setup(&mut rng));
    });
}

fn issue_key(c: &mut Criterion) {
    let mut rng = rng();
    let pkg = Authority::<Pkg>::setup(&mut rng);
    let alice = IdentityValue::derive_str("sender.alice@gmail.com");
    c.bench_function("Authority::issue_key", |b| {
        b.iter(|| pkg.issue_key(&mut rng, &alice).unwrap());
    });
}

fn protocol(c: &mut Criterion) {
    let mut rng = rng();
    let pkg = Authority::<Pkg>::setup(&mut rng);
    let ts = Authority::<TimeServer>::setup(&mut rng);
    let params = SystemParams::new(&pkg, &ts);
    let alice = IdentityValue::derive_str("sender.alice@gmail.com");
    let bob = IdentityValue::derive_str("bob@example.org");
    let time = IdentityValue::derive_str("2025-5-5 12:00:00");
    let alice_key = pkg.issue_key(&mut rng, &alice).unwrap();
    let bob_key = pkg.issue_key(&mut rng, &bob).unwrap();
    let trapdoor = ts.issue_key(&mut rng, &time).unwrap();
    let message = Gt::random(&mut rng);

    c.bench_function("cca::encrypt", |b| {
        b.iter(|| cca::encrypt(&mut rng, &params, &alice, &alice_key, &time, &message));
    });

    let (ciphertext, session) =
        cca::encrypt(&mut rng, &params, &alice, &alice_key, &time, &message);
    c.bench_function("rk_gen", |b| {
        b.iter(|| rk_gen(&mut rng, &alice_key, &ciphertext));
    });

    let delegation = rk_gen(&mut rng, &alice_key, &ciphertext);
    let token = delegation.rj_gen(&mut rng, &params.pkg, &bob);
    let signed = session.authorize(&ciphertext, &delegation);
    c.bench_function("cca::re_encrypt", |b| {
        b.iter(|| cca::re_encrypt(&mut rng, &params.pkg, &ciphertext, &signed).unwrap());
    });

    let reciphertext = cca::re_encrypt(&mut rng, &params.pkg, &ciphertext, &signed).unwrap();
    let bridge = dec1(&bob_key, &token);
    c.bench_function("cca::dec2", |b| {
        b.iter(|| cca::dec2(&params.pkg, &reciphertext, &signed, &trapdoor, &bridge).unwrap());
    });
}

criterion_group!(benches, setup, issue_key, protocol);
criterion_main!(benches);
