mod ask_api_test;
mod database_api_test;
mod models_api_test;
mod support;
