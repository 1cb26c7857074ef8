mod common;

use axum::http::StatusCode;
use common::{get_request, json_request, TestApp};
use serde_json::{json, Value as JsonValue};

async fn create_candidate(app: &TestApp, token: &str, body: JsonValue) -> (StatusCode, JsonValue) {
    app.send(json_request("POST", "/api/candidates", Some(token), &body))
        .await
}

async fn move_stage(
    app: &TestApp,
    token: &str,
    id: &str,
    body: JsonValue,
) -> (StatusCode, JsonValue) {
    app.send(json_request(
        "POST",
        &format!("/api/candidates/{}/stage", id),
        Some(token),
        &body,
    ))
    .await
}

#[tokio::test]
async fn invalid_cpf_is_rejected() {
    let app = TestApp::spawn().await;
    let token = app.login().await;
    let (status, _) = create_candidate(
        &app,
        &token,
        json!({ "full_name": "Ana Souza", "email": "ana@example.com", "tax_id": "111.111.111-11" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn rejection_archives_and_gates_the_next_application() {
    let app = TestApp::spawn().await;
    let token = app.login().await;

    let (status, created) = create_candidate(
        &app,
        &token,
        json!({
            "full_name": "Ana Souza",
            "email": "ana@example.com",
            "phone": "(11) 98888-7777",
            "tax_id": "529.982.247-25"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", created);
    assert_eq!(created["tax_id"], "52998224725");
    let id = created["id"].as_str().unwrap().to_string();

    let (status, _) = move_stage(&app, &token, &id, json!({ "stage": "reprovado" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "rejection needs a reason");

    let (status, outcome) = move_stage(
        &app,
        &token,
        &id,
        json!({ "stage": "reprovado", "rejection_reason": "Perfil não aderente" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", outcome);
    assert_eq!(outcome["outcome"], "rejected");
    assert_eq!(outcome["history"]["final_status"], "rejected");
    assert_eq!(outcome["history"]["notes"], "Perfil não aderente");

    let (status, _) = app
        .send(get_request(&format!("/api/candidates/{}", id), Some(&token)))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, history) = app.send(get_request("/api/history", Some(&token))).await;
    assert_eq!(history.as_array().unwrap().len(), 1);

    let history_id = outcome["history"]["id"].as_str().unwrap();
    let (status, log) = app
        .send(get_request(
            &format!("/api/history/{}/stages", history_id),
            Some(&token),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(log[0]["stage"], "reprovado");
    assert_eq!(log[0]["id"], outcome["record"]["id"]);
    assert_eq!(log[0]["history_id"], history_id);

    let again = json!({
        "full_name": "Ana Souza",
        "email": "ana.souza@example.com",
        "tax_id": "52998224725"
    });
    let (status, body) = create_candidate(&app, &token, again.clone()).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["duplicate"]["has_been_rejected"], true);
    assert_eq!(body["duplicate"]["matches"].as_array().unwrap().len(), 1);

    let mut forced = again;
    forced["force"] = json!(true);
    let (status, _) = create_candidate(&app, &token, forced).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn duplicate_lookup_by_phone() {
    let app = TestApp::spawn().await;
    let token = app.login().await;

    let (_, created) = create_candidate(
        &app,
        &token,
        json!({ "full_name": "Bruno Lima", "email": "bruno@example.com", "phone": "11977776666" }),
    )
    .await;
    let id = created["id"].as_str().unwrap().to_string();
    move_stage(
        &app,
        &token,
        &id,
        json!({ "stage": "reprovado", "rejection_reason": "Sem disponibilidade" }),
    )
    .await;

    let (status, report) = app
        .send(get_request(
            "/api/candidates/duplicates?phone=(11)%2097777-6666",
            Some(&token),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["matches"].as_array().unwrap().len(), 1);
    assert_eq!(report["has_been_rejected"], true);
    assert_eq!(report["has_talent_pool"], false);
}

#[tokio::test]
async fn stage_moves_are_logged_and_validated() {
    let app = TestApp::spawn().await;
    let token = app.login().await;
    let (_, created) = create_candidate(
        &app,
        &token,
        json!({ "full_name": "Carla Dias", "email": "carla@example.com" }),
    )
    .await;
    let id = created["id"].as_str().unwrap().to_string();

    let (status, _) = move_stage(&app, &token, &id, json!({ "stage": "contratado" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = move_stage(
        &app,
        &token,
        &id,
        json!({ "stage": "entrevista_rh", "score": 10.5 }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, outcome) = move_stage(
        &app,
        &token,
        &id,
        json!({ "stage": "entrevista_rh", "score": 8.5, "notes": "Boa comunicação" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["outcome"], "moved");
    assert_eq!(outcome["candidate"]["current_stage"], "entrevista_rh");
    assert_eq!(outcome["candidate"]["status"], "in_process");

    let (status, outcome) =
        move_stage(&app, &token, &id, json!({ "stage": "entrevista_rh" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["outcome"], "unchanged");

    let (_, log) = app
        .send(get_request(&format!("/api/candidates/{}/stages", id), Some(&token)))
        .await;
    assert_eq!(log.as_array().unwrap().len(), 1);

    let (status, outcome) = move_stage(&app, &token, &id, json!({ "stage": "aprovado" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["outcome"], "hired");
    assert_eq!(outcome["candidate"]["status"], "hired");

    let (status, _) =
        move_stage(&app, &token, &id, json!({ "stage": "triagem" })).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn board_groups_candidates_by_stage() {
    let app = TestApp::spawn().await;
    let token = app.login().await;
    let (_, first) = create_candidate(
        &app,
        &token,
        json!({ "full_name": "Davi Rocha", "email": "davi@example.com" }),
    )
    .await;
    create_candidate(
        &app,
        &token,
        json!({ "full_name": "Elisa Melo", "email": "elisa@example.com" }),
    )
    .await;
    let id = first["id"].as_str().unwrap().to_string();
    move_stage(&app, &token, &id, json!({ "stage": "teste_tecnico" })).await;

    let (status, board) = app
        .send(get_request("/api/pipeline/board", Some(&token)))
        .await;
    assert_eq!(status, StatusCode::OK);
    let columns = board.as_array().unwrap();
    assert_eq!(columns.len(), 8);
    assert_eq!(columns[0]["stage"], "triagem");
    assert_eq!(columns[0]["candidates"].as_array().unwrap().len(), 1);
    assert_eq!(columns[3]["stage"], "teste_tecnico");
    assert_eq!(columns[3]["candidates"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn proposal_responses() {
    let app = TestApp::spawn().await;
    let token = app.login().await;
    let (_, declining) = create_candidate(
        &app,
        &token,
        json!({ "full_name": "Fabio Nunes", "email": "fabio@example.com" }),
    )
    .await;
    let (_, accepting) = create_candidate(
        &app,
        &token,
        json!({ "full_name": "Gabi Prado", "email": "gabi@example.com" }),
    )
    .await;
    let declining = declining["id"].as_str().unwrap().to_string();
    let accepting = accepting["id"].as_str().unwrap().to_string();

    let (status, outcome) = app
        .send(json_request(
            "POST",
            &format!("/api/candidates/{}/proposal-response", declining),
            Some(&token),
            &json!({ "accepted": false }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["outcome"], "declined");
    assert_eq!(outcome["candidate"]["talent_pool"], true);
    assert!(outcome["candidate"]["talent_notes"]
        .as_str()
        .unwrap()
        .ends_with("Proposta recusada pelo candidato"));

    let (status, outcome) = app
        .send(json_request(
            "POST",
            &format!("/api/candidates/{}/proposal-response", accepting),
            Some(&token),
            &json!({ "accepted": true }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["outcome"], "accepted");
    assert_eq!(outcome["history"]["final_status"], "approved");

    let (_, list) = app.send(get_request("/api/candidates", Some(&token))).await;
    assert_eq!(list["total"], 1);
    let (_, pool) = app.send(get_request("/api/talent-pool", Some(&token))).await;
    assert_eq!(pool["total"], 1);
}
