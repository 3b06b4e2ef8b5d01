// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, post, put},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{auth, exams, folders, results, students},
    state::AppState,
    utils::jwt::{auth_middleware, student_middleware, teacher_middleware},
};

/// Assembles the main application router.
///
/// * Public login routes for teachers and students.
/// * Teacher routes: students, folders, exams, questions, grading.
/// * Student routes: exam paper and submission.
/// * Global middleware (Trace, CORS) and shared state.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin([
            HeaderValue::from_static("http://localhost:3000"),
            HeaderValue::from_static("http://127.0.0.1:3000"),
        ])
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let auth_routes = Router::new()
        .route("/teacher/login", post(auth::teacher_login))
        .route("/student/login", post(auth::student_login));

    let teacher_routes = Router::new()
        .route(
            "/students",
            get(students::list_students).post(students::create_student),
        )
        .route(
            "/students/{id}",
            get(students::get_student)
                .put(students::update_student)
                .delete(students::delete_student),
        )
        .route(
            "/folders",
            get(folders::list_folders).post(folders::create_folder),
        )
        .route(
            "/folders/{id}",
            put(folders::update_folder).delete(folders::delete_folder),
        )
        .route("/folders/{id}/exams", get(folders::list_folder_exams))
        .route("/exams", get(exams::list_exams).post(exams::create_exam))
        .route(
            "/exams/{id}",
            get(exams::get_exam)
                .put(exams::update_exam)
                .delete(exams::delete_exam),
        )
        .route("/exams/{id}/results", get(exams::list_exam_results))
        .route("/questions/{id}", put(exams::update_question))
        .route("/results/{id}/grade", put(results::grade_result))
        // Auth first, then the role check
        .layer(middleware::from_fn(teacher_middleware))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let student_routes = Router::new()
        .route("/exams/{id}/paper", get(exams::get_paper))
        .route("/results", post(results::submit_result))
        .layer(middleware::from_fn(student_middleware))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Either role; the handler narrows students to their own history.
    let shared_routes = Router::new()
        .route("/students/{id}/results", get(students::list_student_results))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let api_routes = Router::new()
        .nest("/auth", auth_routes)
        .merge(teacher_routes)
        .merge(student_routes)
        .merge(shared_routes);

    Router::new()
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
