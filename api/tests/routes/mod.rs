mod health_test;
mod sessions;
