// handlers/mod.rs - handlers grouped by the gate chain in front of them
//
// Public (no gates) → Protected (token gate) → Elevated (token gate + role gate)
pub mod elevated;
pub mod protected;
pub mod public;

/*
REQUEST CHAIN:

Every route below /api passes through the token gate, which verifies the
bearer token and loads the caller's identity from the store. Elevated routes
then pass through a role gate built for that route group:

    Router::new()
        .route("/api/users", get(elevated::users::list_get))
        .route_layer(from_fn_with_state(Arc::new(RoleGate::new(roles::STAFF)), require_roles))
        .route_layer(from_fn_with_state(state.token_gate.clone(), jwt_auth_middleware))

route_layer applies outermost-last, so the token gate runs first. A role
gate reached without an identity answers 401, which points at a wiring bug
rather than a caller problem.
*/
