// Credit/tier gate: tier rules, the pure ledger, its Postgres store, and the
// billing endpoints (balance, activity, Stripe checkout + webhook).

pub mod handlers;
pub mod ledger;
pub mod store;
pub mod tier;
