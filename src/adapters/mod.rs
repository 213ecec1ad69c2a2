// Adapters
// チェンジログリソースへのアクセスを抽象化

pub mod resource_accessor;
