pub mod cpf;
pub mod crypto;
pub mod text;
pub mod time;
pub mod token;
