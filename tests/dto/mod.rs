pub mod chat_dto_tests;
